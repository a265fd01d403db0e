//! # Inbound Ports
//!
//! What the party registry can do.

use crate::domain::RegistryError;
use shared_types::{Party, PartyName};

/// Party registry - inbound port.
pub trait PartyRegistry: Send + Sync {
    /// Resolve a name to its party.
    ///
    /// # Errors
    ///
    /// `RegistryError::UnknownParty` if nothing is registered under `name`.
    fn resolve(&self, name: &PartyName) -> Result<Party, RegistryError>;

    /// Add a party. Intended for startup only.
    fn register(&self, party: Party) -> Result<(), RegistryError>;

    /// Snapshot of every registered party, sorted by name.
    fn parties(&self) -> Vec<Party>;

    /// Whether `name` is registered.
    fn contains(&self, name: &PartyName) -> bool {
        self.resolve(name).is_ok()
    }
}
