//! # Protocol Message Payloads
//!
//! The messages of the agreement exchange.
//!
//! ## Design Rules
//!
//! - All payloads travel inside an `Envelope<ProtocolMessage>`.
//! - Payloads never carry a sender field. The envelope's `sender` is authoritative.
//! - Every request gets exactly one reply, correlated by `correlation_id`.
//!
//! ```text
//! Initiator                         Counterparty
//!     │ ──── Proposal(record) ────────→ │  validate + stage
//!     │ ←─── Ack(Accept | Reject) ───── │
//!     │ ──── Commit(record) ──────────→ │  commit staged record
//!     │ ←─── Committed ──────────────── │
//!     │                                 │
//!     │ ──── Abort (on failure) ──────→ │  drop staged record
//!     │ ←─── Aborted ────────────────── │
//! ```

use crate::entities::{LinearId, SharedStateRecord};
use serde::{Deserialize, Serialize};

/// Candidate record sent by the initiator. Not yet committed anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMessage {
    /// The draft record.
    pub record: SharedStateRecord,
}

/// Counterparty decision on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckDecision {
    /// Proposal accepted and staged.
    Accept,
    /// Proposal declined.
    Reject {
        /// Human-readable reason.
        reason: String,
    },
}

/// Reply to a `ProposalMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckMessage {
    /// The proposal being answered.
    pub linear_id: LinearId,
    /// Accept or reject.
    pub decision: AckDecision,
}

impl AckMessage {
    /// Accepting ack.
    pub fn accept(linear_id: LinearId) -> Self {
        Self {
            linear_id,
            decision: AckDecision::Accept,
        }
    }

    /// Rejecting ack.
    pub fn reject(linear_id: LinearId, reason: impl Into<String>) -> Self {
        Self {
            linear_id,
            decision: AckDecision::Reject {
                reason: reason.into(),
            },
        }
    }

    /// Whether the proposal was accepted.
    pub fn is_accept(&self) -> bool {
        matches!(self.decision, AckDecision::Accept)
    }
}

/// Instruction to commit the identical record after unanimous accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    /// The record, identical to the proposal.
    pub record: SharedStateRecord,
}

/// Outcome reported by a counterparty after a commit instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitOutcome {
    /// The record is now durable in the counterparty's store.
    Committed,
    /// The counterparty could not commit.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Reply to a `CommitMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedMessage {
    /// The committed record id.
    pub linear_id: LinearId,
    /// Commit outcome.
    pub outcome: CommitOutcome,
}

/// Best-effort notice that a staged proposal is void.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortMessage {
    /// The aborted proposal.
    pub linear_id: LinearId,
    /// Why the initiator aborted.
    pub reason: String,
}

/// Every message of the agreement exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    /// Initiator → counterparty.
    Proposal(ProposalMessage),
    /// Counterparty → initiator.
    Ack(AckMessage),
    /// Initiator → counterparty.
    Commit(CommitMessage),
    /// Counterparty → initiator.
    Committed(CommittedMessage),
    /// Initiator → counterparty.
    Abort(AbortMessage),
    /// Counterparty → initiator.
    Aborted {
        /// The aborted proposal.
        linear_id: LinearId,
    },
}

impl ProtocolMessage {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Proposal(_) => "proposal",
            Self::Ack(_) => "ack",
            Self::Commit(_) => "commit",
            Self::Committed(_) => "committed",
            Self::Abort(_) => "abort",
            Self::Aborted { .. } => "aborted",
        }
    }

    /// The record id this message refers to.
    pub fn linear_id(&self) -> LinearId {
        match self {
            Self::Proposal(m) => m.record.linear_id,
            Self::Ack(m) => m.linear_id,
            Self::Commit(m) => m.record.linear_id,
            Self::Committed(m) => m.linear_id,
            Self::Abort(m) => m.linear_id,
            Self::Aborted { linear_id } => *linear_id,
        }
    }
}
