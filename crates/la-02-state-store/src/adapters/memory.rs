use crate::domain::updates::UPDATE_CHANNEL_CAPACITY;
use crate::domain::{CommitStatus, RecordIndex, StateUpdates, StoreError};
use crate::ports::StateStore;
use parking_lot::RwLock;
use shared_types::{LinearId, SharedStateRecord, TypeTag};
use tokio::sync::broadcast;
use tracing::debug;

/// In-memory implementation of `StateStore`.
pub struct InMemoryStateStore {
    index: RwLock<RecordIndex>,
    updates: broadcast::Sender<SharedStateRecord>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            index: RwLock::new(RecordIndex::new()),
            updates,
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn commit(&self, record: SharedStateRecord) -> Result<CommitStatus, StoreError> {
        let mut index = self.index.write();
        let status = index.insert(record.clone())?;
        if status == CommitStatus::Inserted {
            debug!(linear_id = %record.linear_id, "Record committed");
            // No trackers is fine.
            let _ = self.updates.send(record);
        }
        Ok(status)
    }

    fn query_by_type(&self, tag: &TypeTag) -> Result<Vec<SharedStateRecord>, StoreError> {
        Ok(self.index.read().by_type(tag))
    }

    fn query_by_linear_id(&self, id: &LinearId) -> Result<SharedStateRecord, StoreError> {
        self.index
            .read()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    fn track(&self) -> StateUpdates {
        StateUpdates::new(self.updates.subscribe())
    }

    fn len(&self) -> usize {
        self.index.read().len()
    }
}
