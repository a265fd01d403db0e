//! # Domain Entities

use super::errors::AgreementError;
use super::value_objects::AgreementState;
use shared_types::{LinearId, PartyName, SharedStateRecord, TypeTag};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// Request for an N-party agreement. The initiator must be a participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalRequest {
    /// Every party that must hold the record, initiator included.
    pub participants: Vec<PartyName>,
    /// Type tag of the drafted record.
    pub state_type: TypeTag,
    /// Opaque payload.
    pub payload: String,
    /// Time allowed for the whole exchange.
    pub deadline: Duration,
}

impl ProposalRequest {
    /// Two-party request with the initiator listed first.
    pub fn bilateral(
        initiator: PartyName,
        counterparty: PartyName,
        state_type: TypeTag,
        payload: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            participants: vec![initiator, counterparty],
            state_type,
            payload: payload.into(),
            deadline,
        }
    }
}

/// One agreement as tracked by its initiator.
#[derive(Clone, Debug)]
pub struct AgreementSession {
    pub linear_id: LinearId,
    pub participants: Vec<PartyName>,
    pub state: AgreementState,
    /// Set when the session aborts.
    pub failure: Option<String>,
}

impl AgreementSession {
    /// Create a new session in `Drafting`.
    pub fn new(record: &SharedStateRecord) -> Self {
        Self {
            linear_id: record.linear_id,
            participants: record.participants.clone(),
            state: AgreementState::Drafting,
            failure: None,
        }
    }

    /// Transition to new state.
    pub fn transition_to(&mut self, new_state: AgreementState) -> Result<(), AgreementError> {
        if !self.state.can_transition_to(new_state) {
            return Err(AgreementError::InvalidTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }
        self.state = new_state;
        Ok(())
    }

    /// Abort with a reason. No-op once terminal.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.state.can_transition_to(AgreementState::Aborted) {
            self.state = AgreementState::Aborted;
            self.failure = Some(reason.into());
        }
    }
}

/// Initiator sessions: every open one, plus a bounded window of finished ones.
#[derive(Debug)]
pub struct SessionTable {
    sessions: HashMap<LinearId, AgreementSession>,
    finished: VecDeque<LinearId>,
    retain: usize,
}

impl SessionTable {
    /// Table keeping at most `retain` finished sessions.
    pub fn new(retain: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            finished: VecDeque::new(),
            retain,
        }
    }

    pub fn open(&mut self, record: &SharedStateRecord) {
        self.sessions
            .insert(record.linear_id, AgreementSession::new(record));
    }

    pub fn transition(
        &mut self,
        linear_id: LinearId,
        next: AgreementState,
    ) -> Result<(), AgreementError> {
        let session = self
            .sessions
            .get_mut(&linear_id)
            .ok_or_else(|| AgreementError::InvalidTransition {
                from: "<no session>".to_string(),
                to: next.to_string(),
            })?;
        session.transition_to(next)?;
        if next.is_terminal() {
            self.finish(linear_id);
        }
        Ok(())
    }

    /// Abort an open session. Finished sessions are left alone.
    pub fn abort(&mut self, linear_id: LinearId, reason: impl Into<String>) {
        let Some(session) = self.sessions.get_mut(&linear_id) else {
            return;
        };
        if session.state.is_terminal() {
            return;
        }
        session.abort(reason);
        self.finish(linear_id);
    }

    pub fn get(&self, linear_id: &LinearId) -> Option<&AgreementSession> {
        self.sessions.get(linear_id)
    }

    /// Sessions held, open and finished.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn finish(&mut self, linear_id: LinearId) {
        self.finished.push_back(linear_id);
        while self.finished.len() > self.retain {
            if let Some(evicted) = self.finished.pop_front() {
                self.sessions.remove(&evicted);
            }
        }
    }
}

/// A record a counterparty accepted but has not yet committed.
#[derive(Clone, Debug)]
pub struct StagedRecord {
    pub record: SharedStateRecord,
    /// Party whose proposal was accepted. Only it may commit or abort.
    pub proposer: PartyName,
    pub expires_at: Instant,
}

impl StagedRecord {
    pub fn new(record: SharedStateRecord, proposer: PartyName, ttl: Duration) -> Self {
        Self {
            record,
            proposer,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
