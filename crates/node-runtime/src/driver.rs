//! # Driver
//!
//! Starts parties in-process on one network, hands out their services, and
//! shuts them down again. Tests and the demo binary drive agreements through it.
//!
//! ```text
//! Driver ── start_party("PartyA") ──→ PartyNode { service, inbound loop }
//!        ── start_party("PartyB") ──→ PartyNode { service, inbound loop }
//!                     │                      ↑
//!                     └── InMemoryNetwork ───┘
//! ```

use crate::adapters::PartyStore;
use crate::container::config::{NodeConfig, PartyEntry};
use crate::container::{PartyNode, PartyService};
use anyhow::{bail, Context, Result};
use la_01_party_registry::{InMemoryPartyRegistry, PartyRegistry};
use la_02_state_store::StateStore;
use la_03_agreement::{AcceptWellFormed, AgreementApi, AgreementService, ProposalValidator};
use shared_channel::InMemoryNetwork;
use shared_types::{LinearId, Party, PartyName, SharedStateRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// In-process network of started parties.
pub struct Driver {
    config: NodeConfig,
    registry: Arc<InMemoryPartyRegistry>,
    network: Arc<InMemoryNetwork>,
    nodes: BTreeMap<PartyName, PartyNode>,
}

impl Driver {
    /// Build the network map from `config`. No party is started yet.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let registry = InMemoryPartyRegistry::from_parties(
            config.network.parties.iter().map(PartyEntry::to_party),
        )
        .context("Failed to build network map")?;
        let network = InMemoryNetwork::with_capacity(config.network.mailbox_capacity);

        Ok(Self {
            config,
            registry: Arc::new(registry),
            network: Arc::new(network),
            nodes: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn network(&self) -> &Arc<InMemoryNetwork> {
        &self.network
    }

    pub fn registry(&self) -> &Arc<InMemoryPartyRegistry> {
        &self.registry
    }

    /// Start `name` with the default validator.
    ///
    /// Parties missing from the configured network map are registered first.
    pub fn start_party(&mut self, name: &str) -> Result<Arc<PartyService>> {
        self.start_party_with(name, Arc::new(AcceptWellFormed))
    }

    /// Start `name` with a custom proposal validator.
    pub fn start_party_with(
        &mut self,
        name: &str,
        validator: Arc<dyn ProposalValidator>,
    ) -> Result<Arc<PartyService>> {
        let name = PartyName::new(name);
        if self.nodes.contains_key(&name) {
            bail!("party {} already started", name);
        }
        if !self.registry.contains(&name) {
            self.registry
                .register(Party::in_memory(name.as_str()))
                .with_context(|| format!("Failed to register {}", name))?;
        }

        let store = PartyStore::open(&self.config.storage, &name)
            .with_context(|| format!("Failed to open store for {}", name))?;
        let service = Arc::new(
            AgreementService::new(
                name.clone(),
                self.config.protocol.to_agreement_config(),
                Arc::clone(&self.registry),
                Arc::clone(&self.network),
                Arc::new(store),
            )
            .with_validator(validator),
        );

        let mailbox = self.network.connect(name.clone());
        let node = PartyNode::start(Arc::clone(&service), mailbox);
        self.nodes.insert(name.clone(), node);
        info!(party = %name, "Party started");

        Ok(service)
    }

    /// Start several parties, in order.
    pub fn start_parties(&mut self, names: &[&str]) -> Result<Vec<Arc<PartyService>>> {
        names.iter().map(|name| self.start_party(name)).collect()
    }

    /// Start every party on the configured network map.
    pub fn start_configured_parties(&mut self) -> Result<Vec<Arc<PartyService>>> {
        let names: Vec<String> = self
            .config
            .network
            .parties
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        names.iter().map(|name| self.start_party(name)).collect()
    }

    /// Service of a started party.
    pub fn party(&self, name: &PartyName) -> Option<&Arc<PartyService>> {
        self.nodes.get(name).map(PartyNode::service)
    }

    /// Network map lookup by name.
    pub fn resolve_name(&self, name: &str) -> Result<Party> {
        Ok(self.registry.resolve(&PartyName::new(name))?)
    }

    /// Stop one party and take it off the network. Later sends to it fail
    /// with `Unreachable`.
    pub async fn stop_party(&mut self, name: &PartyName) -> bool {
        self.network.disconnect(name);
        match self.nodes.remove(name) {
            Some(node) => {
                node.stop().await;
                true
            }
            None => false,
        }
    }

    /// Stop every party.
    pub async fn shutdown(mut self) {
        info!(parties = self.nodes.len(), "Shutting down driver");
        let nodes = std::mem::take(&mut self.nodes);
        for (name, node) in nodes {
            self.network.disconnect(&name);
            node.stop().await;
        }
    }
}

/// Outcome of `run_demo`.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub linear_id: LinearId,
    /// Each participant's stored copy.
    pub views: Vec<(PartyName, SharedStateRecord)>,
}

impl DemoReport {
    /// Whether every participant holds the identical record.
    pub fn converged(&self) -> bool {
        !self.views.is_empty() && self.views.windows(2).all(|w| w[0].1 == w[1].1)
    }
}

/// Start the configured parties, run one agreement from the first to the
/// second, and collect both stores' views.
pub async fn run_demo(config: NodeConfig, payload: &str) -> Result<DemoReport> {
    let mut driver = Driver::new(config)?;
    let services = driver.start_configured_parties()?;
    let (initiator, counterparty) = match services.as_slice() {
        [a, b, ..] => (Arc::clone(a), Arc::clone(b)),
        _ => bail!("demo needs at least 2 parties"),
    };

    let linear_id = initiator
        .initiate(counterparty.party(), payload)
        .await
        .with_context(|| format!("Agreement {} -> {} failed", initiator.party(), counterparty.party()))?;

    let mut views = Vec::with_capacity(2);
    for service in [&initiator, &counterparty] {
        let record = service
            .store()
            .query_by_linear_id(&linear_id)
            .with_context(|| format!("{} has no record {}", service.party(), linear_id))?;
        views.push((service.party().clone(), record));
    }

    driver.shutdown().await;
    Ok(DemoReport { linear_id, views })
}
