//! # Agreement Flow Scenarios
//!
//! Two parties on one in-memory network, driven end to end:
//!
//! 1. **Convergence**: a successful agreement leaves identical records at both
//! 2. **Rejection**: a declined proposal is committed nowhere
//! 3. **Timeout**: a lost or late message fails the agreement and mutates nothing
//! 4. **Routing failures**: unreachable and unknown counterparties
//! 5. **Split commit round**: a counterparty lost between ack and commit

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use la_02_state_store::StateStore;
    use la_03_agreement::{
        AgreementApi, AgreementError, AgreementState, FnValidator, ProposalRequest,
    };
    use node_runtime::{init_test_telemetry, Driver, NodeConfig};
    use shared_channel::LinkFault;
    use shared_types::{PartyName, SharedStateRecord, TypeTag};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn party_a() -> PartyName {
        PartyName::new("PartyA")
    }

    fn party_b() -> PartyName {
        PartyName::new("PartyB")
    }

    fn party_c() -> PartyName {
        PartyName::new("PartyC")
    }

    fn records(store: &impl StateStore) -> Vec<SharedStateRecord> {
        store
            .query_by_type(&TypeTag::shared_state_record())
            .unwrap()
    }

    // =============================================================================
    // CONVERGENCE
    // =============================================================================

    #[tokio::test]
    async fn test_two_parties_converge_on_one_record() {
        init_test_telemetry();
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();

        let linear_id = a.initiate(&party_b(), "Data").await.unwrap();

        let at_a = records(a.store().as_ref());
        let at_b = records(b.store().as_ref());
        assert_eq!(at_a.len(), 1);
        assert_eq!(at_b.len(), 1);
        assert_eq!(at_a[0], at_b[0]);
        assert_eq!(at_a[0].linear_id, linear_id);
        assert_eq!(at_a[0].payload, "Data");
        assert_eq!(at_a[0].participants, vec![party_a(), party_b()]);
        assert_eq!(at_a[0].digest().unwrap(), at_b[0].digest().unwrap());
        assert_eq!(a.session_state(&linear_id), Some(AgreementState::Committed));

        driver.shutdown().await;
    }

    #[tokio::test]
    async fn test_agreements_in_both_directions() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();

        let first = a.initiate(&party_b(), "from A").await.unwrap();
        let second = b.initiate(&party_a(), "from B").await.unwrap();

        assert_eq!(records(a.store().as_ref()), records(b.store().as_ref()));
        assert_eq!(
            b.store().query_by_linear_id(&second).unwrap().participants,
            vec![party_b(), party_a()]
        );
        assert_ne!(first, second);

        driver.shutdown().await;
    }

    // =============================================================================
    // REJECTION
    // =============================================================================

    #[tokio::test]
    async fn test_rejected_proposal_leaves_both_stores_empty() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver
            .start_party_with(
                "PartyB",
                Arc::new(FnValidator::new(|_: &PartyName, record: &SharedStateRecord| {
                    if record.payload == "Forbidden" {
                        Err("payload not allowed".to_string())
                    } else {
                        Ok(())
                    }
                })),
            )
            .unwrap();

        let err = a.initiate(&party_b(), "Forbidden").await.unwrap_err();

        assert_eq!(
            err,
            AgreementError::Rejected {
                party: party_b(),
                reason: "payload not allowed".to_string()
            }
        );
        assert!(a.store().is_empty());
        assert!(b.store().is_empty());
        assert_eq!(b.staged_count(), 0);

        // The counterparty still accepts other proposals.
        a.initiate(&party_b(), "Data").await.unwrap();
        assert_eq!(b.store().len(), 1);

        driver.shutdown().await;
    }

    // =============================================================================
    // TIMEOUT
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_dropped_proposal_times_out_without_mutation() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();
        driver
            .network()
            .set_fault(&party_a(), &party_b(), LinkFault::Drop);

        let err = a.initiate(&party_b(), "Data").await.unwrap_err();

        assert_eq!(err, AgreementError::Timeout { party: party_b() });
        assert!(err.is_retryable());
        assert!(a.store().is_empty());
        assert!(b.store().is_empty());

        driver.network().heal();
        a.initiate(&party_b(), "Data").await.unwrap();
        assert_eq!(b.store().len(), 1);

        driver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_commit_is_never_applied() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();
        let deadline = Duration::from_millis(driver.config().protocol.deadline_ms);
        // The proposal fits in the deadline, the commit does not.
        driver.network().set_fault(
            &party_a(),
            &party_b(),
            LinkFault::Delay(deadline * 3 / 5),
        );

        let err = a.initiate(&party_b(), "Data").await.unwrap_err();

        assert!(matches!(err, AgreementError::Timeout { .. }));
        assert!(a.store().is_empty());
        assert!(b.store().is_empty());

        // The staged copy lapses on its own.
        let ttl = Duration::from_millis(driver.config().protocol.staged_ttl_ms);
        tokio::time::sleep(ttl).await;
        assert_eq!(b.staged_count(), 0);
        assert!(b.store().is_empty());

        driver.shutdown().await;
    }

    // =============================================================================
    // ROUTING FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_partitioned_counterparty_is_unreachable() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();
        driver.network().partition(&party_a(), &party_b());

        let err = a.initiate(&party_b(), "Data").await.unwrap_err();

        assert!(matches!(err, AgreementError::Unreachable { .. }));
        assert!(a.store().is_empty());
        assert!(b.store().is_empty());

        driver.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_counterparty_sends_nothing() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        driver.start_party("PartyB").unwrap();

        let err = a
            .initiate(&PartyName::new("PartyZ"), "Data")
            .await
            .unwrap_err();

        assert_eq!(err, AgreementError::UnknownParty(PartyName::new("PartyZ")));
        assert!(!err.is_retryable());
        assert_eq!(driver.network().stats().delivered, 0);

        driver.shutdown().await;
    }

    // =============================================================================
    // SPLIT COMMIT ROUND
    // =============================================================================

    /// One counterparty becomes unreachable after acking. The other has already
    /// committed when `initiate` fails, and keeps the record.
    #[tokio::test]
    async fn test_counterparty_lost_after_ack_leaves_others_committed() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let a = driver.start_party("PartyA").unwrap();
        let b = driver.start_party("PartyB").unwrap();
        let network = Arc::clone(driver.network());
        let c = driver
            .start_party_with(
                "PartyC",
                Arc::new(FnValidator::new(move |proposer: &PartyName, _: &SharedStateRecord| {
                    network.partition(proposer, &PartyName::new("PartyC"));
                    Ok(())
                })),
            )
            .unwrap();

        let request = ProposalRequest {
            participants: vec![party_a(), party_b(), party_c()],
            state_type: TypeTag::shared_state_record(),
            payload: "Data".to_string(),
            deadline: Duration::from_secs(5),
        };
        let err = a.initiate_with(request).await.unwrap_err();

        assert!(matches!(err, AgreementError::Unreachable { ref party, .. } if *party == party_c()));
        let held = records(b.store().as_ref());
        assert_eq!(held.len(), 1);
        assert_eq!(a.session_state(&held[0].linear_id), Some(AgreementState::Aborted));
        assert!(a.store().is_empty());
        assert!(c.store().is_empty());

        driver.shutdown().await;
    }
}
