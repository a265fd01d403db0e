//! # Durability and Tracking Scenarios
//!
//! File-backed parties keep their ledger across restarts and hold their
//! journal exclusively; trackers see each agreed record exactly once.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use la_02_state_store::{FileStateStore, StateStore, StoreError};
    use la_03_agreement::AgreementApi;
    use node_runtime::container::config::StorageBackend;
    use node_runtime::{Driver, NodeConfig};
    use shared_types::{PartyName, TypeTag};
    use tempfile::TempDir;
    use tokio_stream::StreamExt;

    fn file_config(dir: &TempDir) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.storage.backend = StorageBackend::File;
        config.storage.data_dir = dir.path().to_path_buf();
        config
    }

    // =============================================================================
    // FILE JOURNALS
    // =============================================================================

    #[tokio::test]
    async fn test_ledgers_survive_restart_in_commit_order() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);

        let ids = {
            let mut driver = Driver::new(config.clone()).unwrap();
            let a = driver.start_party("PartyA").unwrap();
            driver.start_party("PartyB").unwrap();
            let mut ids = Vec::new();
            for payload in ["first", "second", "third"] {
                ids.push(a.initiate(&PartyName::new("PartyB"), payload).await.unwrap());
            }
            drop(a);
            driver.shutdown().await;
            ids
        };

        let mut driver = Driver::new(config).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();

        let tag = TypeTag::shared_state_record();
        let at_a = a.store().query_by_type(&tag).unwrap();
        let at_b = b.store().query_by_type(&tag).unwrap();
        assert_eq!(at_a, at_b);
        assert_eq!(
            at_a.iter().map(|r| r.linear_id).collect::<Vec<_>>(),
            ids
        );

        // New agreements append after the replayed ones.
        let fourth = b.initiate(&PartyName::new("PartyA"), "fourth").await.unwrap();
        assert_eq!(a.store().query_by_type(&tag).unwrap()[3].linear_id, fourth);

        driver.shutdown().await;
    }

    #[tokio::test]
    async fn test_running_party_holds_its_journal() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        let journal = config.storage.journal_path(&PartyName::new("PartyA"));

        let mut driver = Driver::new(config).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        driver.start_party("PartyB").unwrap();
        a.initiate(&PartyName::new("PartyB"), "Data").await.unwrap();

        assert!(matches!(
            FileStateStore::open(&journal),
            Err(StoreError::JournalLocked { .. })
        ));

        drop(a);
        driver.shutdown().await;

        // Released once the party is gone.
        let reopened = FileStateStore::open(&journal).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    // =============================================================================
    // TRACKING
    // =============================================================================

    #[tokio::test]
    async fn test_both_trackers_see_the_agreed_record_once() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();

        let mut a_updates = a.store().track();
        let b_updates = b.store().track().into_stream();
        tokio::pin!(b_updates);

        let linear_id = a.initiate(&PartyName::new("PartyB"), "Data").await.unwrap();

        let seen_by_a = a_updates.recv().await.unwrap();
        let seen_by_b = b_updates.next().await.unwrap();
        assert_eq!(seen_by_a.linear_id, linear_id);
        assert_eq!(seen_by_a, seen_by_b);

        // Nothing else was committed.
        assert!(
            tokio::time::timeout(Duration::from_millis(50), a_updates.recv())
                .await
                .is_err()
        );

        driver.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_agreement_emits_no_update() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();
        let mut b_updates = b.store().track();
        driver
            .network()
            .partition(&PartyName::new("PartyA"), &PartyName::new("PartyB"));

        assert!(a.initiate(&PartyName::new("PartyB"), "Data").await.is_err());

        assert!(
            tokio::time::timeout(Duration::from_millis(50), b_updates.recv())
                .await
                .is_err()
        );

        driver.shutdown().await;
    }
}
