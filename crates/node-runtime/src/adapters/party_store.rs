//! # Party Store Adapter
//!
//! Selects a party's `StateStore` backend from configuration.

use crate::container::config::{StorageBackend, StorageConfig};
use la_02_state_store::{
    CommitStatus, FileStateStore, InMemoryStateStore, StateStore, StateUpdates, StoreError,
};
use shared_types::{LinearId, PartyName, SharedStateRecord, TypeTag};
use tracing::info;

/// A party's store, with the backend chosen at startup.
pub enum PartyStore {
    Memory(InMemoryStateStore),
    File(FileStateStore),
}

impl PartyStore {
    /// Open the store `config` selects for `party`.
    pub fn open(config: &StorageConfig, party: &PartyName) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Memory => Ok(Self::Memory(InMemoryStateStore::new())),
            StorageBackend::File => {
                let path = config.journal_path(party);
                info!(party = %party, path = %path.display(), "Opening party journal");
                Ok(Self::File(FileStateStore::open(path)?))
            }
        }
    }

    fn inner(&self) -> &dyn StateStore {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
        }
    }
}

impl StateStore for PartyStore {
    fn commit(&self, record: SharedStateRecord) -> Result<CommitStatus, StoreError> {
        self.inner().commit(record)
    }

    fn query_by_type(&self, tag: &TypeTag) -> Result<Vec<SharedStateRecord>, StoreError> {
        self.inner().query_by_type(tag)
    }

    fn query_by_linear_id(&self, id: &LinearId) -> Result<SharedStateRecord, StoreError> {
        self.inner().query_by_linear_id(id)
    }

    fn track(&self) -> StateUpdates {
        self.inner().track()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }
}
