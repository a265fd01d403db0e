//! # Domain Value Objects

use serde::{Deserialize, Serialize};
use shared_types::TypeTag;
use std::fmt;
use std::time::Duration;

/// Agreement state machine, as seen by the initiator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgreementState {
    /// Record drafted, nothing sent yet.
    #[default]
    Drafting,
    /// Proposals sent, awaiting acks.
    Proposed,
    /// Every counterparty accepted.
    Acknowledged,
    /// Record committed at every participant.
    Committed,
    /// Exchange failed; the initiator committed nothing.
    Aborted,
}

impl AgreementState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: AgreementState) -> bool {
        match (self, next) {
            (Self::Drafting, Self::Proposed) => true,
            (Self::Proposed, Self::Acknowledged) => true,
            (Self::Acknowledged, Self::Committed) => true,
            (Self::Drafting | Self::Proposed | Self::Acknowledged, Self::Aborted) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

impl fmt::Display for AgreementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drafting => "Drafting",
            Self::Proposed => "Proposed",
            Self::Acknowledged => "Acknowledged",
            Self::Committed => "Committed",
            Self::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

/// Agreement protocol configuration.
#[derive(Clone, Debug)]
pub struct AgreementConfig {
    /// Deadline for a whole `initiate` call when the caller gives none.
    pub default_deadline: Duration,
    /// How long a counterparty keeps an accepted, uncommitted record.
    pub staged_ttl: Duration,
    /// Largest accepted payload, in bytes.
    pub max_payload_bytes: usize,
    /// Deadline for each best-effort abort notice.
    pub abort_timeout: Duration,
    /// Type tag given to records drafted by `initiate`.
    pub state_type: TypeTag,
    /// Finished sessions kept for `session_state`, oldest evicted first.
    pub retained_sessions: usize,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            default_deadline: Duration::from_secs(5),
            staged_ttl: Duration::from_secs(30),
            max_payload_bytes: 64 * 1024,
            abort_timeout: Duration::from_millis(500),
            state_type: TypeTag::shared_state_record(),
            retained_sessions: 1024,
        }
    }
}
