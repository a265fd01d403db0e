use shared_types::LinearId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Duplicate linear id {linear_id}: stored record differs from the one committed")]
    DuplicateLinearId { linear_id: LinearId },

    #[error("Record not found: {0}")]
    NotFound(LinearId),

    #[error("Invalid page: number {page_number}, size {page_size} (both must be >= 1)")]
    InvalidPage { page_number: usize, page_size: usize },

    #[error("Journal {path:?} is locked by another process")]
    JournalLocked { path: PathBuf },

    #[error("Journal {path:?} could not be rolled back after a failed write; commits refused")]
    JournalPoisoned { path: PathBuf },

    #[error("Journal corrupted at line {line}: {reason}")]
    CorruptedJournal { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
