//! # File-backed State Store
//!
//! Records are appended to a JSON-lines journal, one record per line, and
//! `fsync`ed before `commit` returns. The journal is replayed on open.
//!
//! An exclusive `fs2` lock is held on the journal for the lifetime of the
//! store, so two stores can never share one journal.
//!
//! A failed append is truncated back to the previous end of the journal. If
//! that truncation fails too, the store is poisoned and refuses commits.

use crate::domain::updates::UPDATE_CHANNEL_CAPACITY;
use crate::domain::{CommitStatus, RecordIndex, StateUpdates, StoreError};
use crate::ports::StateStore;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use shared_types::{LinearId, SharedStateRecord, TypeTag};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Append target of the journal.
trait JournalFile: Write {
    fn end(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn end(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Why an append did not land.
#[derive(Debug)]
enum AppendError {
    /// Nothing of the line remains in the journal.
    RolledBack(io::Error),
    /// Part of the line may remain in the journal.
    Torn { write: io::Error, rollback: io::Error },
}

/// Append `line` and sync it, or leave the journal as it was.
fn append_line(journal: &mut impl JournalFile, line: &[u8]) -> Result<(), AppendError> {
    let start = journal.end().map_err(AppendError::RolledBack)?;
    let written = journal.write_all(line).and_then(|()| journal.sync());
    match written {
        Ok(()) => Ok(()),
        Err(write) => match journal.truncate(start).and_then(|()| journal.sync()) {
            Ok(()) => Err(AppendError::RolledBack(write)),
            Err(rollback) => Err(AppendError::Torn { write, rollback }),
        },
    }
}

struct Journal {
    file: File,
    poisoned: bool,
}

pub struct FileStateStore {
    path: PathBuf,
    journal: Mutex<Journal>,
    index: RwLock<RecordIndex>,
    updates: broadcast::Sender<SharedStateRecord>,
}

impl FileStateStore {
    /// Open (or create) the journal at `path` and replay it.
    ///
    /// # Errors
    ///
    /// - `JournalLocked` if another store holds the journal
    /// - `CorruptedJournal` if a complete line cannot be replayed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(StoreError::JournalLocked { path });
        }

        let index = Self::replay(&mut file, &path)?;
        info!(path = %path.display(), records = index.len(), "State journal opened");

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            journal: Mutex::new(Journal {
                file,
                poisoned: false,
            }),
            index: RwLock::new(index),
            updates,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(file: &mut File, path: &Path) -> Result<RecordIndex, StoreError> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let mut index = RecordIndex::new();
        let mut offset = 0usize;
        for (line_no, line) in contents.split_inclusive('\n').enumerate() {
            let complete = line.ends_with('\n');
            let text = line.trim();
            if !text.is_empty() {
                match serde_json::from_str::<SharedStateRecord>(text) {
                    Ok(record) => {
                        index
                            .insert(record)
                            .map_err(|e| StoreError::CorruptedJournal {
                                line: line_no + 1,
                                reason: e.to_string(),
                            })?;
                    }
                    // Torn final write from a crash mid-append.
                    Err(e) if !complete => {
                        warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %e,
                            "Discarding incomplete journal tail"
                        );
                        file.set_len(offset as u64)?;
                        break;
                    }
                    Err(e) => {
                        return Err(StoreError::CorruptedJournal {
                            line: line_no + 1,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            offset += line.len();
        }
        Ok(index)
    }
}

impl StateStore for FileStateStore {
    fn commit(&self, record: SharedStateRecord) -> Result<CommitStatus, StoreError> {
        let mut journal = self.journal.lock();
        if journal.poisoned {
            return Err(StoreError::JournalPoisoned {
                path: self.path.clone(),
            });
        }

        if self.index.read().check(&record)? == CommitStatus::AlreadyPresent {
            return Ok(CommitStatus::AlreadyPresent);
        }

        let mut line = serde_json::to_string(&record)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        line.push('\n');
        match append_line(&mut journal.file, line.as_bytes()) {
            Ok(()) => {}
            Err(AppendError::RolledBack(e)) => {
                warn!(linear_id = %record.linear_id, error = %e, "Journal append failed, rolled back");
                return Err(e.into());
            }
            Err(AppendError::Torn { write, rollback }) => {
                error!(
                    path = %self.path.display(),
                    error = %write,
                    rollback_error = %rollback,
                    "Journal left torn, refusing further commits"
                );
                journal.poisoned = true;
                return Err(StoreError::JournalPoisoned {
                    path: self.path.clone(),
                });
            }
        }

        let status = self.index.write().insert(record.clone())?;
        debug!(linear_id = %record.linear_id, path = %self.path.display(), "Record journaled");
        // No trackers is fine.
        let _ = self.updates.send(record);
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

impl Drop for FileStateStore {
    fn drop(&mut self) {
        let _ = self.journal.get_mut().file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::PartyName;
    use tempfile::TempDir;

    fn record(payload: &str) -> SharedStateRecord {
        SharedStateRecord::draft(
            TypeTag::shared_state_record(),
            payload,
            vec![PartyName::new("PartyA"), PartyName::new("PartyB")],
        )
    }

    #[test]
    fn test_reopen_replays_records_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("party-a").join("journal.jsonl");
        let first = record("1");
        let second = record("2");

        {
            let store = FileStateStore::open(&path).unwrap();
            store.commit(first.clone()).unwrap();
            store.commit(second.clone()).unwrap();
            store.commit(first.clone()).unwrap();
        }

        let store = FileStateStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.query_by_type(&TypeTag::shared_state_record()).unwrap(),
            vec![first, second]
        );
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");

        let _store = FileStateStore::open(&path).unwrap();
        assert!(matches!(
            FileStateStore::open(&path),
            Err(StoreError::JournalLocked { .. })
        ));
    }

    #[test]
    fn test_conflicting_commit_not_journaled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let r = record("Data");

        {
            let store = FileStateStore::open(&path).unwrap();
            store.commit(r.clone()).unwrap();
            let mut conflicting = r.clone();
            conflicting.payload = "Other".to_string();
            assert!(store.commit(conflicting).is_err());
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_torn_tail_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let r = record("Data");

        {
            let store = FileStateStore::open(&path).unwrap();
            store.commit(r.clone()).unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"linear_id\":").unwrap();
        drop(file);

        let store = FileStateStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        let second = record("More");
        store.commit(second.clone()).unwrap();
        drop(store);

        let store = FileStateStore::open(&path).unwrap();
        assert_eq!(store.query_by_linear_id(&second.linear_id).unwrap(), second);
    }

    /// Writes `keep` bytes of the next line, then fails.
    struct FailingWrite {
        file: File,
        keep: usize,
        fail_truncate: bool,
    }

    impl Write for FailingWrite {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.keep == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = buf.len().min(self.keep);
            self.keep -= n;
            self.file.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl JournalFile for FailingWrite {
        fn end(&self) -> io::Result<u64> {
            self.file.end()
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.fail_truncate {
                return Err(io::Error::other("read-only"));
            }
            self.file.truncate(len)
        }

        fn sync(&mut self) -> io::Result<()> {
            self.file.sync()
        }
    }

    fn line(r: &SharedStateRecord) -> Vec<u8> {
        let mut line = serde_json::to_vec(r).unwrap();
        line.push(b'\n');
        line
    }

    #[test]
    fn test_failed_append_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let first = record("1");
        {
            let store = FileStateStore::open(&path).unwrap();
            store.commit(first.clone()).unwrap();
        }
        let before = std::fs::metadata(&path).unwrap().len();

        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let mut journal = FailingWrite {
            file,
            keep: 10,
            fail_truncate: false,
        };
        let result = append_line(&mut journal, &line(&record("lost")));
        assert!(matches!(result, Err(AppendError::RolledBack(_))));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), before);
        drop(journal);

        // The next commit lands on a clean line and the journal still replays.
        let second = record("2");
        {
            let store = FileStateStore::open(&path).unwrap();
            store.commit(second.clone()).unwrap();
        }
        let store = FileStateStore::open(&path).unwrap();
        assert_eq!(
            store.query_by_type(&TypeTag::shared_state_record()).unwrap(),
            vec![first, second]
        );
    }

    #[test]
    fn test_failed_rollback_reports_torn_journal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        let mut journal = FailingWrite {
            file,
            keep: 10,
            fail_truncate: true,
        };

        let result = append_line(&mut journal, &line(&record("lost")));

        assert!(matches!(result, Err(AppendError::Torn { .. })));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 10);
    }

    #[test]
    fn test_poisoned_store_refuses_commits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let store = FileStateStore::open(&path).unwrap();
        store.journal.lock().poisoned = true;

        assert_eq!(
            store.commit(record("Data")),
            Err(StoreError::JournalPoisoned { path: path.clone() })
        );
        assert!(store.is_empty());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_corrupted_middle_line_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        assert!(matches!(
            FileStateStore::open(&path),
            Err(StoreError::CorruptedJournal { line: 1, .. })
        ));
    }
}
