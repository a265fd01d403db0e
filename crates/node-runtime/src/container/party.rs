//! # Party Node
//!
//! One running party: its agreement service plus the task answering its mailbox.

use crate::adapters::PartyStore;
use la_01_party_registry::InMemoryPartyRegistry;
use la_03_agreement::{AgreementApi, AgreementService};
use shared_channel::{InMemoryNetwork, Mailbox};
use shared_types::PartyName;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Agreement service as wired by the runtime.
pub type PartyService = AgreementService<InMemoryPartyRegistry, InMemoryNetwork, PartyStore>;

/// A started party.
pub struct PartyNode {
    service: Arc<PartyService>,
    shutdown_tx: watch::Sender<bool>,
    inbound: JoinHandle<()>,
}

impl PartyNode {
    /// Spawn the inbound loop for `service` on `mailbox`.
    ///
    /// Each delivery is answered on its own task. On shutdown the loop waits
    /// for answers already in progress.
    pub fn start(service: Arc<PartyService>, mut mailbox: Mailbox) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let responder = Arc::clone(&service);

        let inbound = tokio::spawn(async move {
            let party = mailbox.owner().clone();
            let mut in_flight = JoinSet::new();
            loop {
                tokio::select! {
                    delivery = mailbox.recv() => {
                        let Some(delivery) = delivery else {
                            debug!(party = %party, "Mailbox closed");
                            break;
                        };
                        let service = Arc::clone(&responder);
                        in_flight.spawn(async move {
                            if let Err(e) = service.respond(delivery).await {
                                warn!(party = %service.party(), error = %e, "Failed to answer delivery");
                            }
                        });
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                    _ = shutdown_rx.changed() => {
                        info!(party = %party, "Shutdown signal received");
                        break;
                    }
                }
            }
            while in_flight.join_next().await.is_some() {}
        });

        Self {
            service,
            shutdown_tx,
            inbound,
        }
    }

    pub fn name(&self) -> &PartyName {
        self.service.party()
    }

    pub fn service(&self) -> &Arc<PartyService> {
        &self.service
    }

    /// This party's store.
    pub fn store(&self) -> &Arc<PartyStore> {
        self.service.store()
    }

    /// Stop the inbound loop and wait for it to exit.
    pub async fn stop(self) {
        if self.shutdown_tx.send(true).is_err() {
            debug!(party = %self.name(), "Inbound loop already stopped");
        }
        if let Err(e) = self.inbound.await {
            warn!(error = %e, "Inbound loop panicked");
        }
    }
}
