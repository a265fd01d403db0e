use crate::domain::{CommitStatus, Page, PageSpecification, StateUpdates, StoreError};
use shared_types::{LinearId, SharedStateRecord, TypeTag};

/// Per-party store of agreed records.
///
/// Each party exclusively owns its store; other parties only ever reach it
/// through the agreement protocol.
pub trait StateStore: Send + Sync {
    /// Durably commit `record`.
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateLinearId` if a different record is stored under
    /// the same id. An identical record returns `CommitStatus::AlreadyPresent`.
    fn commit(&self, record: SharedStateRecord) -> Result<CommitStatus, StoreError>;

    /// All records of type `tag`, in this store's insertion order.
    fn query_by_type(&self, tag: &TypeTag) -> Result<Vec<SharedStateRecord>, StoreError>;

    /// One page of `query_by_type`.
    fn query_by_type_paged(
        &self,
        tag: &TypeTag,
        page: PageSpecification,
    ) -> Result<Page, StoreError> {
        page.apply(self.query_by_type(tag)?)
    }

    /// The record stored under `id`.
    fn query_by_linear_id(&self, id: &LinearId) -> Result<SharedStateRecord, StoreError>;

    /// Subscribe to future commits.
    fn track(&self) -> StateUpdates;

    /// Number of stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
