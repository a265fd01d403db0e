//! # Domain Errors

use shared_types::{NetworkAddress, PartyName};
use thiserror::Error;

/// Party registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No party registered under this name. Local and non-retryable.
    #[error("Unknown party: {0}")]
    UnknownParty(PartyName),

    /// A party with this name is already registered.
    #[error("Party already registered: {0}")]
    DuplicateParty(PartyName),

    /// Another party already listens on this address.
    #[error("Address {address} already used by {owner}")]
    AddressInUse {
        /// Contested address.
        address: NetworkAddress,
        /// Party that owns it.
        owner: PartyName,
    },
}
