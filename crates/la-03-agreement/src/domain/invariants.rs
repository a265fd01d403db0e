//! # Domain Invariants
//!
//! Well-formedness rules every proposal must satisfy before any validator runs.

use super::errors::ProposalViolation;
use shared_types::{PartyName, SharedStateRecord};
use std::collections::HashSet;

/// Minimum number of participants in an agreement.
pub const MIN_PARTICIPANTS: usize = 2;

/// Invariant: participants are unique and there are at least two of them.
pub fn invariant_participants(record: &SharedStateRecord) -> Result<(), ProposalViolation> {
    let mut seen = HashSet::with_capacity(record.participants.len());
    for party in &record.participants {
        if !seen.insert(party) {
            return Err(ProposalViolation::DuplicateParticipant(party.clone()));
        }
    }
    if record.participants.len() < MIN_PARTICIPANTS {
        return Err(ProposalViolation::TooFewParticipants(
            record.participants.len(),
        ));
    }
    Ok(())
}

/// Invariant: payload fits within `limit` bytes.
pub fn invariant_payload_size(
    record: &SharedStateRecord,
    limit: usize,
) -> Result<(), ProposalViolation> {
    let size = record.payload.len();
    if size > limit {
        return Err(ProposalViolation::PayloadTooLarge { size, limit });
    }
    Ok(())
}

/// Check every rule for a proposal `sender` sent to `receiver`.
///
/// Local conflicts are not checked here; they need the receiver's store.
pub fn check_well_formed(
    record: &SharedStateRecord,
    sender: &PartyName,
    receiver: &PartyName,
    max_payload_bytes: usize,
) -> Result<(), ProposalViolation> {
    if record.linear_id.is_nil() {
        return Err(ProposalViolation::NilLinearId);
    }
    if !record.has_participant(sender) {
        return Err(ProposalViolation::SenderNotParticipant(sender.clone()));
    }
    if !record.has_participant(receiver) {
        return Err(ProposalViolation::ReceiverNotParticipant(receiver.clone()));
    }
    invariant_participants(record)?;
    invariant_payload_size(record, max_payload_bytes)
}
