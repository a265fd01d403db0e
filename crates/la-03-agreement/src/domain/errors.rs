//! # Domain Errors

use la_01_party_registry::RegistryError;
use la_02_state_store::StoreError;
use shared_channel::ChannelError;
use shared_types::{LinearId, PartyName};
use thiserror::Error;

/// Why a proposal is not well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalViolation {
    #[error("linear id is nil")]
    NilLinearId,

    #[error("sender {0} is not a participant")]
    SenderNotParticipant(PartyName),

    #[error("receiver {0} is not a participant")]
    ReceiverNotParticipant(PartyName),

    #[error("participant {0} listed more than once")]
    DuplicateParticipant(PartyName),

    #[error("at least 2 participants required, got {0}")]
    TooFewParticipants(usize),

    #[error("payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("linear id {0} already holds a different record")]
    ConflictingRecord(LinearId),
}

/// Agreement protocol errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgreementError {
    /// A participant is not in the registry. Nothing was sent.
    #[error("Unknown party: {0}")]
    UnknownParty(PartyName),

    /// A participant could not be reached.
    #[error("Party {party} unreachable: {reason}")]
    Unreachable { party: PartyName, reason: String },

    /// A participant did not reply before the deadline.
    #[error("Timed out waiting for {party}")]
    Timeout { party: PartyName },

    /// A participant declined the proposal.
    #[error("Proposal rejected by {party}: {reason}")]
    Rejected { party: PartyName, reason: String },

    /// A participant accepted but failed to commit.
    #[error("Commit failed at {party}: {reason}")]
    CommitFailed { party: PartyName, reason: String },

    /// A different record already exists under this id.
    #[error("Duplicate linear id: {linear_id}")]
    DuplicateLinearId { linear_id: LinearId },

    /// The initiator's own request is malformed.
    #[error("Invalid proposal: {0}")]
    InvalidProposal(#[from] ProposalViolation),

    #[error("Invalid agreement transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// A peer answered with the wrong message kind.
    #[error("Unexpected {kind} from {party}")]
    UnexpectedMessage { party: PartyName, kind: &'static str },

    #[error("Registry error: {0}")]
    Registry(RegistryError),

    #[error("Channel error: {0}")]
    Channel(ChannelError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl AgreementError {
    /// Whether the caller may retry `initiate` with a fresh proposal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }
}

impl From<RegistryError> for AgreementError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownParty(name) => Self::UnknownParty(name),
            other => Self::Registry(other),
        }
    }
}

impl From<ChannelError> for AgreementError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Unreachable { party, reason } => Self::Unreachable { party, reason },
            ChannelError::Timeout { party } => Self::Timeout { party },
            other => Self::Channel(other),
        }
    }
}

impl From<StoreError> for AgreementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateLinearId { linear_id } => Self::DuplicateLinearId { linear_id },
            other => Self::Store(other),
        }
    }
}
