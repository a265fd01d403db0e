//! Stock `ProposalValidator`s.

use crate::ports::ProposalValidator;
use shared_types::{PartyName, SharedStateRecord};

/// Accepts every well-formed proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptWellFormed;

impl ProposalValidator for AcceptWellFormed {
    fn validate(&self, _proposer: &PartyName, _record: &SharedStateRecord) -> Result<(), String> {
        Ok(())
    }
}

/// Validator backed by a closure.
pub struct FnValidator<F>(F);

impl<F> FnValidator<F>
where
    F: Fn(&PartyName, &SharedStateRecord) -> Result<(), String> + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<F> ProposalValidator for FnValidator<F>
where
    F: Fn(&PartyName, &SharedStateRecord) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, proposer: &PartyName, record: &SharedStateRecord) -> Result<(), String> {
        (self.0)(proposer, record)
    }
}
