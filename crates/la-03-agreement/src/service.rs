//! Agreement Service - Core business logic
//!
//! One `AgreementService` acts for one party: it initiates agreements through
//! the channel and answers the protocol messages its mailbox receives.

use crate::adapters::AcceptWellFormed;
use crate::domain::invariants::{invariant_participants, invariant_payload_size};
use crate::domain::{
    check_well_formed, AgreementConfig, AgreementError, AgreementState, ProposalRequest,
    ProposalViolation, SessionTable, StagedRecord,
};
use crate::ports::{AgreementApi, ProposalValidator};
use async_trait::async_trait;
use futures::future::join_all;
use la_01_party_registry::PartyRegistry;
use la_02_state_store::{StateStore, StoreError};
use parking_lot::{Mutex, RwLock};
use shared_channel::{Delivery, MessageChannel};
use shared_types::{
    AbortMessage, AckDecision, AckMessage, CommitMessage, CommitOutcome, CommittedMessage,
    LinearId, PartyName, ProposalMessage, ProtocolMessage, SharedStateRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Agreement Service implementation
pub struct AgreementService<R, C, S>
where
    R: PartyRegistry,
    C: MessageChannel,
    S: StateStore,
{
    party: PartyName,
    config: AgreementConfig,
    registry: Arc<R>,
    channel: Arc<C>,
    store: Arc<S>,
    validator: Arc<dyn ProposalValidator>,
    /// Agreements this party initiated.
    sessions: RwLock<SessionTable>,
    /// Proposals this party accepted and has not yet committed.
    staged: Mutex<HashMap<LinearId, StagedRecord>>,
}

impl<R, C, S> AgreementService<R, C, S>
where
    R: PartyRegistry,
    C: MessageChannel,
    S: StateStore,
{
    /// Create a service that accepts every well-formed proposal.
    pub fn new(
        party: PartyName,
        config: AgreementConfig,
        registry: Arc<R>,
        channel: Arc<C>,
        store: Arc<S>,
    ) -> Self {
        let sessions = SessionTable::new(config.retained_sessions);
        Self {
            party,
            config,
            registry,
            channel,
            store,
            validator: Arc::new(AcceptWellFormed),
            sessions: RwLock::new(sessions),
            staged: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the proposal validator.
    pub fn with_validator(mut self, validator: Arc<dyn ProposalValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &AgreementConfig {
        &self.config
    }

    /// This party's store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Number of accepted proposals awaiting commit.
    pub fn staged_count(&self) -> usize {
        let now = Instant::now();
        self.staged
            .lock()
            .values()
            .filter(|s| !s.is_expired(now))
            .count()
    }

    /// Sessions currently held: open ones plus the retained finished ones.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    // =========================================================================
    // Initiator side
    // =========================================================================

    async fn run_agreement(
        &self,
        record: &SharedStateRecord,
        counterparties: &[PartyName],
        deadline: Instant,
    ) -> Result<(), AgreementError> {
        let linear_id = record.linear_id;
        self.transition(linear_id, AgreementState::Proposed)?;

        let acks = join_all(
            counterparties
                .iter()
                .map(|to| self.propose_to(to, record, deadline)),
        )
        .await;
        let (accepted, failure) = partition_outcomes(counterparties, acks);
        if let Some(err) = failure {
            self.notify_abort(linear_id, &accepted, &err).await;
            return Err(err);
        }
        self.transition(linear_id, AgreementState::Acknowledged)?;

        let commits = join_all(
            counterparties
                .iter()
                .map(|to| self.commit_to(to, record, deadline)),
        )
        .await;
        let (committed, failure) = partition_outcomes(counterparties, commits);
        if let Some(err) = failure {
            let pending: Vec<PartyName> = counterparties
                .iter()
                .filter(|p| !committed.contains(p))
                .cloned()
                .collect();
            self.notify_abort(linear_id, &pending, &err).await;
            return Err(err);
        }

        self.store.commit(record.clone())?;
        self.transition(linear_id, AgreementState::Committed)?;
        Ok(())
    }

    async fn propose_to(
        &self,
        to: &PartyName,
        record: &SharedStateRecord,
        deadline: Instant,
    ) -> Result<(), AgreementError> {
        let message = ProtocolMessage::Proposal(ProposalMessage {
            record: record.clone(),
        });
        match self.channel.send(&self.party, to, message, deadline).await? {
            ProtocolMessage::Ack(ack) if ack.linear_id == record.linear_id => match ack.decision {
                AckDecision::Accept => Ok(()),
                AckDecision::Reject { reason } => Err(AgreementError::Rejected {
                    party: to.clone(),
                    reason,
                }),
            },
            other => Err(AgreementError::UnexpectedMessage {
                party: to.clone(),
                kind: other.kind(),
            }),
        }
    }

    async fn commit_to(
        &self,
        to: &PartyName,
        record: &SharedStateRecord,
        deadline: Instant,
    ) -> Result<(), AgreementError> {
        let message = ProtocolMessage::Commit(CommitMessage {
            record: record.clone(),
        });
        match self.channel.send(&self.party, to, message, deadline).await? {
            ProtocolMessage::Committed(reply) if reply.linear_id == record.linear_id => {
                match reply.outcome {
                    CommitOutcome::Committed => Ok(()),
                    CommitOutcome::Failed { reason } => Err(AgreementError::CommitFailed {
                        party: to.clone(),
                        reason,
                    }),
                }
            }
            other => Err(AgreementError::UnexpectedMessage {
                party: to.clone(),
                kind: other.kind(),
            }),
        }
    }

    /// Tell `parties` to drop their staged copy. Failures are only logged.
    async fn notify_abort(&self, linear_id: LinearId, parties: &[PartyName], cause: &AgreementError) {
        if parties.is_empty() {
            return;
        }
        let deadline = Instant::now() + self.config.abort_timeout;
        let reason = cause.to_string();
        let notices = parties.iter().map(|to| {
            let message = ProtocolMessage::Abort(AbortMessage {
                linear_id,
                reason: reason.clone(),
            });
            async move {
                if let Err(e) = self.channel.send(&self.party, to, message, deadline).await {
                    debug!(peer = %to, %linear_id, error = %e, "Abort notice not delivered");
                }
            }
        });
        join_all(notices).await;
    }

    fn open_session(&self, record: &SharedStateRecord) {
        self.sessions.write().open(record);
    }

    fn transition(&self, linear_id: LinearId, next: AgreementState) -> Result<(), AgreementError> {
        self.sessions.write().transition(linear_id, next)
    }

    fn abort_session(&self, linear_id: LinearId, err: &AgreementError) {
        self.sessions.write().abort(linear_id, err.to_string());
    }

    // =========================================================================
    // Counterparty side
    // =========================================================================

    fn on_proposal(&self, proposer: &PartyName, record: &SharedStateRecord) -> AckMessage {
        let linear_id = record.linear_id;
        match self.admit(proposer, record) {
            Ok(()) => {
                info!(party = %self.party, peer = %proposer, %linear_id, "Proposal accepted");
                AckMessage::accept(linear_id)
            }
            Err(reason) => {
                warn!(party = %self.party, peer = %proposer, %linear_id, %reason, "Proposal rejected");
                AckMessage::reject(linear_id, reason)
            }
        }
    }

    /// Well-formedness, local conflicts, then the validator. Stages on success.
    fn admit(&self, proposer: &PartyName, record: &SharedStateRecord) -> Result<(), String> {
        check_well_formed(record, proposer, &self.party, self.config.max_payload_bytes)
            .map_err(|v| v.to_string())?;

        let conflict = || ProposalViolation::ConflictingRecord(record.linear_id).to_string();
        match self.store.query_by_linear_id(&record.linear_id) {
            Ok(existing) if existing != *record => return Err(conflict()),
            Ok(_) | Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.to_string()),
        }

        let now = Instant::now();
        let mut staged = self.staged.lock();
        staged.retain(|_, s| !s.is_expired(now));
        if let Some(existing) = staged.get(&record.linear_id) {
            if existing.record != *record || existing.proposer != *proposer {
                return Err(conflict());
            }
        }

        self.validator.validate(proposer, record)?;

        staged.insert(
            record.linear_id,
            StagedRecord::new(record.clone(), proposer.clone(), self.config.staged_ttl),
        );
        Ok(())
    }

    fn on_commit(&self, proposer: &PartyName, record: &SharedStateRecord) -> CommittedMessage {
        let linear_id = record.linear_id;
        let outcome = match self.commit_staged(proposer, record) {
            Ok(()) => {
                let digest = record.digest().map(|d| d.to_string()).unwrap_or_default();
                info!(party = %self.party, peer = %proposer, %linear_id, %digest, "Record committed");
                CommitOutcome::Committed
            }
            Err(reason) => {
                warn!(party = %self.party, peer = %proposer, %linear_id, %reason, "Commit refused");
                CommitOutcome::Failed { reason }
            }
        };
        CommittedMessage { linear_id, outcome }
    }

    fn commit_staged(&self, proposer: &PartyName, record: &SharedStateRecord) -> Result<(), String> {
        let mut staged = self.staged.lock();
        match staged.get(&record.linear_id) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                staged.remove(&record.linear_id);
                Err("staged proposal expired".to_string())
            }
            Some(entry) if entry.proposer != *proposer => {
                Err(format!("proposal was staged by {}", entry.proposer))
            }
            Some(entry) if entry.record != *record => {
                Err("record differs from staged proposal".to_string())
            }
            Some(_) => {
                self.store.commit(record.clone()).map_err(|e| e.to_string())?;
                staged.remove(&record.linear_id);
                Ok(())
            }
            // Repeated commit after a lost reply.
            None => match self.store.query_by_linear_id(&record.linear_id) {
                Ok(existing) if existing == *record => Ok(()),
                _ => Err("no staged proposal".to_string()),
            },
        }
    }

    fn on_abort(&self, proposer: &PartyName, abort: &AbortMessage) {
        let mut staged = self.staged.lock();
        let owned = staged
            .get(&abort.linear_id)
            .map(|s| s.proposer == *proposer)
            .unwrap_or(false);
        if owned {
            staged.remove(&abort.linear_id);
            info!(
                party = %self.party,
                peer = %proposer,
                linear_id = %abort.linear_id,
                reason = %abort.reason,
                "Staged proposal aborted"
            );
        }
    }
}

#[async_trait]
impl<R, C, S> AgreementApi for AgreementService<R, C, S>
where
    R: PartyRegistry,
    C: MessageChannel,
    S: StateStore,
{
    fn party(&self) -> &PartyName {
        &self.party
    }

    async fn initiate(
        &self,
        counterparty: &PartyName,
        payload: &str,
    ) -> Result<LinearId, AgreementError> {
        let request = ProposalRequest::bilateral(
            self.party.clone(),
            counterparty.clone(),
            self.config.state_type.clone(),
            payload,
            self.config.default_deadline,
        );
        self.initiate_with(request).await
    }

    #[instrument(skip(self, request), fields(party = %self.party))]
    async fn initiate_with(&self, request: ProposalRequest) -> Result<LinearId, AgreementError> {
        if !request.participants.contains(&self.party) {
            return Err(ProposalViolation::SenderNotParticipant(self.party.clone()).into());
        }
        let deadline = Instant::now() + request.deadline;
        let record =
            SharedStateRecord::draft(request.state_type, request.payload, request.participants);
        invariant_participants(&record)?;
        invariant_payload_size(&record, self.config.max_payload_bytes)?;

        let counterparties: Vec<PartyName> = record.counterparties(&self.party).cloned().collect();
        for counterparty in &counterparties {
            self.registry.resolve(counterparty)?;
        }

        let linear_id = record.linear_id;
        self.open_session(&record);
        info!(%linear_id, participants = counterparties.len() + 1, "Agreement started");

        match self.run_agreement(&record, &counterparties, deadline).await {
            Ok(()) => {
                let digest = record.digest().map(|d| d.to_string()).unwrap_or_default();
                info!(%linear_id, %digest, "Agreement committed");
                Ok(linear_id)
            }
            Err(err) => {
                warn!(%linear_id, error = %err, "Agreement aborted");
                self.abort_session(linear_id, &err);
                Err(err)
            }
        }
    }

    async fn respond(&self, delivery: Delivery) -> Result<(), AgreementError> {
        let sender = delivery.envelope().sender.clone();
        let reply = match &delivery.envelope().payload {
            ProtocolMessage::Proposal(proposal) => {
                if !delivery.is_live() {
                    debug!(party = %self.party, peer = %sender, "Skipping expired proposal");
                    return Ok(());
                }
                ProtocolMessage::Ack(self.on_proposal(&sender, &proposal.record))
            }
            ProtocolMessage::Commit(commit) => {
                if !delivery.is_live() {
                    debug!(party = %self.party, peer = %sender, "Skipping expired commit");
                    return Ok(());
                }
                ProtocolMessage::Committed(self.on_commit(&sender, &commit.record))
            }
            ProtocolMessage::Abort(abort) => {
                self.on_abort(&sender, abort);
                ProtocolMessage::Aborted {
                    linear_id: abort.linear_id,
                }
            }
            other => {
                return Err(AgreementError::UnexpectedMessage {
                    party: sender,
                    kind: other.kind(),
                })
            }
        };
        delivery.respond(reply)?;
        Ok(())
    }

    fn session_state(&self, linear_id: &LinearId) -> Option<AgreementState> {
        self.sessions.read().get(linear_id).map(|s| s.state)
    }
}

/// Split per-counterparty results into the parties that succeeded and the
/// first failure in participant order.
fn partition_outcomes(
    counterparties: &[PartyName],
    results: Vec<Result<(), AgreementError>>,
) -> (Vec<PartyName>, Option<AgreementError>) {
    let mut succeeded = Vec::with_capacity(counterparties.len());
    let mut failure = None;
    for (party, result) in counterparties.iter().zip(results) {
        match result {
            Ok(()) => succeeded.push(party.clone()),
            Err(err) => {
                if failure.is_none() {
                    failure = Some(err);
                }
            }
        }
    }
    (succeeded, failure)
}
