//! # Concurrency Scenarios
//!
//! Many agreements in flight at once, across several parties, on a
//! multi-threaded runtime. Every successful agreement must leave the same
//! record at each of its participants and nowhere else.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;
    use la_02_state_store::StateStore;
    use la_03_agreement::{AgreementApi, AgreementError, ProposalRequest};
    use node_runtime::{Driver, NodeConfig};
    use shared_types::{PartyName, TypeTag};

    const PER_PAIR: usize = 4;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_full_mesh_of_concurrent_agreements_converges() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let services = driver
            .start_parties(&["PartyA", "PartyB", "PartyC"])
            .unwrap();

        let mut tasks = Vec::new();
        for initiator in &services {
            for counterparty in &services {
                if initiator.party() == counterparty.party() {
                    continue;
                }
                for i in 0..PER_PAIR {
                    let initiator = initiator.clone();
                    let counterparty = counterparty.party().clone();
                    tasks.push(tokio::spawn(async move {
                        let payload = format!("{}->{}#{}", initiator.party(), counterparty, i);
                        let id = initiator.initiate(&counterparty, &payload).await?;
                        Ok::<_, AgreementError>((initiator.party().clone(), counterparty, id))
                    }));
                }
            }
        }

        let outcomes = join_all(tasks).await;
        assert_eq!(outcomes.len(), 6 * PER_PAIR);

        for outcome in outcomes {
            let (from, to, id) = outcome.unwrap().unwrap();
            let at_from = driver.party(&from).unwrap().store().query_by_linear_id(&id).unwrap();
            let at_to = driver.party(&to).unwrap().store().query_by_linear_id(&id).unwrap();
            assert_eq!(at_from, at_to);
            assert_eq!(at_from.participants, vec![from, to]);
        }

        // Each party took part in 4 ordered pairs.
        for service in &services {
            assert_eq!(service.store().len(), 4 * PER_PAIR);
            assert_eq!(service.staged_count(), 0);
        }

        driver.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_three_party_agreements_in_parallel() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let services = driver
            .start_parties(&["PartyA", "PartyB", "PartyC"])
            .unwrap();
        let participants: Vec<PartyName> = services.iter().map(|s| s.party().clone()).collect();

        let requests = (0..8).map(|i| {
            let initiator = services[i % services.len()].clone();
            // Initiator first, the rest in their usual order.
            let mut order = vec![initiator.party().clone()];
            order.extend(participants.iter().filter(|p| p != &initiator.party()).cloned());
            let request = ProposalRequest {
                participants: order,
                state_type: TypeTag::shared_state_record(),
                payload: format!("trilateral-{}", i),
                deadline: Duration::from_secs(5),
            };
            async move { initiator.initiate_with(request).await }
        });

        let ids: Vec<_> = join_all(requests)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        for id in &ids {
            let reference = services[0].store().query_by_linear_id(id).unwrap();
            assert_eq!(reference.participants.len(), 3);
            for service in &services[1..] {
                assert_eq!(service.store().query_by_linear_id(id).unwrap(), reference);
            }
        }

        driver.shutdown().await;
    }

    #[tokio::test]
    async fn test_one_unreachable_member_blocks_the_whole_group() {
        let mut driver = Driver::new(NodeConfig::default()).unwrap();
        let services = driver
            .start_parties(&["PartyA", "PartyB", "PartyC"])
            .unwrap();
        let (a, b, c) = (&services[0], &services[1], &services[2]);
        driver.network().partition(a.party(), c.party());

        let request = ProposalRequest {
            participants: vec![a.party().clone(), b.party().clone(), c.party().clone()],
            state_type: TypeTag::shared_state_record(),
            payload: "Data".to_string(),
            deadline: Duration::from_secs(5),
        };
        let err = a.initiate_with(request).await.unwrap_err();

        assert!(matches!(err, AgreementError::Unreachable { ref party, .. } if party == c.party()));
        for service in &services {
            assert!(service.store().is_empty());
        }
        // The member that did stage was told to drop it.
        tokio::time::timeout(Duration::from_secs(1), async {
            while b.staged_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        driver.shutdown().await;
    }
}
