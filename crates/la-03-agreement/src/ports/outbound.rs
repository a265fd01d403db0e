//! # Outbound Ports

use shared_types::{PartyName, SharedStateRecord};

/// Local acceptance policy applied to well-formed proposals.
pub trait ProposalValidator: Send + Sync {
    /// `Ok(())` to accept, `Err(reason)` to reject.
    fn validate(&self, proposer: &PartyName, record: &SharedStateRecord) -> Result<(), String>;
}
