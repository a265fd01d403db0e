//! In-memory party registry.

use crate::domain::RegistryError;
use crate::ports::PartyRegistry;
use parking_lot::RwLock;
use shared_types::{NetworkAddress, Party, PartyName};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    by_name: HashMap<PartyName, Party>,
    by_address: HashMap<NetworkAddress, PartyName>,
}

/// Process-wide, read-mostly registry.
#[derive(Default)]
pub struct InMemoryPartyRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryPartyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of parties.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate name or address.
    pub fn from_parties(parties: impl IntoIterator<Item = Party>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for party in parties {
            registry.register(party)?;
        }
        Ok(registry)
    }

    /// Number of registered parties.
    pub fn len(&self) -> usize {
        self.state.read().by_name.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartyRegistry for InMemoryPartyRegistry {
    fn resolve(&self, name: &PartyName) -> Result<Party, RegistryError> {
        let party = self
            .state
            .read()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownParty(name.clone()));
        if party.is_err() {
            debug!(party = %name, "Registry lookup miss");
        }
        party
    }

    fn register(&self, party: Party) -> Result<(), RegistryError> {
        let mut state = self.state.write();

        if state.by_name.contains_key(party.name()) {
            return Err(RegistryError::DuplicateParty(party.name().clone()));
        }
        if let Some(owner) = state.by_address.get(party.address()) {
            return Err(RegistryError::AddressInUse {
                address: party.address().clone(),
                owner: owner.clone(),
            });
        }

        info!(party = %party.name(), address = %party.address(), "Party registered");
        state
            .by_address
            .insert(party.address().clone(), party.name().clone());
        state.by_name.insert(party.name().clone(), party);
        Ok(())
    }

    fn parties(&self) -> Vec<Party> {
        let mut parties: Vec<Party> = self.state.read().by_name.values().cloned().collect();
        parties.sort_by(|a, b| a.name().cmp(b.name()));
        parties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_registered_party() {
        let registry = InMemoryPartyRegistry::new();
        registry.register(Party::in_memory("PartyA")).unwrap();

        let party = registry.resolve(&PartyName::new("PartyA")).unwrap();
        assert_eq!(party.address().as_str(), "mem://PartyA");
    }

    #[test]
    fn test_resolve_unknown_party() {
        let registry = InMemoryPartyRegistry::new();
        let result = registry.resolve(&PartyName::new("PartyZ"));
        assert_eq!(
            result,
            Err(RegistryError::UnknownParty(PartyName::new("PartyZ")))
        );
        assert!(!registry.contains(&PartyName::new("PartyZ")));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = InMemoryPartyRegistry::new();
        registry.register(Party::in_memory("PartyA")).unwrap();

        let result = registry.register(Party::in_memory("PartyA"));
        assert!(matches!(result, Err(RegistryError::DuplicateParty(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let registry = InMemoryPartyRegistry::new();
        let address = NetworkAddress::new("10.0.0.1:10002");
        registry
            .register(Party::new(PartyName::new("PartyA"), address.clone()))
            .unwrap();

        let result = registry.register(Party::new(PartyName::new("PartyB"), address));
        assert!(matches!(result, Err(RegistryError::AddressInUse { .. })));
    }

    #[test]
    fn test_parties_sorted() {
        let registry = InMemoryPartyRegistry::from_parties([
            Party::in_memory("PartyC"),
            Party::in_memory("PartyA"),
            Party::in_memory("PartyB"),
        ])
        .unwrap();

        let names: Vec<_> = registry
            .parties()
            .iter()
            .map(|p| p.name().as_str().to_string())
            .collect();
        assert_eq!(names, vec!["PartyA", "PartyB", "PartyC"]);
    }
}
