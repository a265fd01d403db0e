//! Insertion-ordered record index shared by all store adapters.

use super::errors::StoreError;
use shared_types::{LinearId, SharedStateRecord, TypeTag};
use std::collections::HashMap;

/// Result of a successful `commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// The record is new.
    Inserted,
    /// An identical record was already stored; nothing changed.
    AlreadyPresent,
}

/// Append-only index: records in insertion order plus a lookup by id.
#[derive(Debug, Default)]
pub struct RecordIndex {
    records: Vec<SharedStateRecord>,
    by_id: HashMap<LinearId, usize>,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what committing `record` would do, without changing anything.
    pub fn check(&self, record: &SharedStateRecord) -> Result<CommitStatus, StoreError> {
        match self.by_id.get(&record.linear_id) {
            None => Ok(CommitStatus::Inserted),
            Some(&pos) if self.records[pos] == *record => Ok(CommitStatus::AlreadyPresent),
            Some(_) => Err(StoreError::DuplicateLinearId {
                linear_id: record.linear_id,
            }),
        }
    }

    /// Apply the commit contract.
    pub fn insert(&mut self, record: SharedStateRecord) -> Result<CommitStatus, StoreError> {
        let status = self.check(&record)?;
        if status == CommitStatus::Inserted {
            self.by_id.insert(record.linear_id, self.records.len());
            self.records.push(record);
        }
        Ok(status)
    }

    pub fn get(&self, id: &LinearId) -> Option<&SharedStateRecord> {
        self.by_id.get(id).map(|&pos| &self.records[pos])
    }

    pub fn by_type(&self, tag: &TypeTag) -> Vec<SharedStateRecord> {
        self.records
            .iter()
            .filter(|r| r.state_type == *tag)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
