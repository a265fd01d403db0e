//! # In-Memory Network
//!
//! `MessageChannel` adapter connecting parties that live in one process.
//! Each party connects once and receives a `Mailbox`; senders hold no
//! reference to the recipient's state, only to its inbound queue.

use crate::channel::MessageChannel;
use crate::errors::ChannelError;
use crate::mailbox::{Mailbox, RawDelivery};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Envelope, PartyName, ProtocolMessage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, sleep_until, timeout_at, Instant};
use tracing::{debug, warn};

/// Fault injected on one directed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    /// Sends fail immediately with `Unreachable`.
    Partitioned,
    /// Messages are held back before delivery. A delay that crosses the
    /// deadline means the message is never delivered.
    Delay(Duration),
    /// Messages vanish; the sender times out at its deadline.
    Drop,
}

/// Counters for one network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    /// Envelopes handed to a mailbox queue.
    pub delivered: u64,
    /// Envelopes discarded by a mailbox (expired, undecodable, replayed).
    pub dead_letters: u64,
}

/// In-process network of party mailboxes.
pub struct InMemoryNetwork {
    inboxes: RwLock<HashMap<PartyName, mpsc::Sender<RawDelivery>>>,
    faults: RwLock<HashMap<(PartyName, PartyName), LinkFault>>,
    delivered: AtomicU64,
    dead_letters: Arc<AtomicU64>,
    capacity: usize,
}

impl InMemoryNetwork {
    /// Create a network with default mailbox capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a network with the given mailbox capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inboxes: RwLock::new(HashMap::new()),
            faults: RwLock::new(HashMap::new()),
            delivered: AtomicU64::new(0),
            dead_letters: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Attach `party` to the network and return its mailbox.
    ///
    /// Reconnecting replaces the previous mailbox.
    pub fn connect(&self, party: PartyName) -> Mailbox {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let replaced = self.inboxes.write().insert(party.clone(), sender);
        if replaced.is_some() {
            warn!(party = %party, "Mailbox replaced");
        }
        debug!(party = %party, "Party connected");
        Mailbox::new(party, receiver, self.dead_letters.clone())
    }

    /// Detach `party`. Later sends to it fail with `Unreachable`.
    pub fn disconnect(&self, party: &PartyName) {
        self.inboxes.write().remove(party);
        debug!(party = %party, "Party disconnected");
    }

    /// Whether `party` currently has a mailbox.
    pub fn is_connected(&self, party: &PartyName) -> bool {
        self.inboxes.read().contains_key(party)
    }

    /// Inject a fault on the directed link `from -> to`.
    pub fn set_fault(&self, from: &PartyName, to: &PartyName, fault: LinkFault) {
        self.faults.write().insert((from.clone(), to.clone()), fault);
    }

    /// Remove the fault on the directed link `from -> to`.
    pub fn clear_fault(&self, from: &PartyName, to: &PartyName) {
        self.faults.write().remove(&(from.clone(), to.clone()));
    }

    /// Partition two parties in both directions.
    pub fn partition(&self, a: &PartyName, b: &PartyName) {
        self.set_fault(a, b, LinkFault::Partitioned);
        self.set_fault(b, a, LinkFault::Partitioned);
    }

    /// Remove every injected fault.
    pub fn heal(&self) {
        self.faults.write().clear();
    }

    /// Snapshot of network counters.
    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dead_letters: self.dead_letters.load(Ordering::Relaxed),
        }
    }

    fn fault(&self, from: &PartyName, to: &PartyName) -> Option<LinkFault> {
        self.faults.read().get(&(from.clone(), to.clone())).copied()
    }

    fn inbox(&self, to: &PartyName) -> Option<mpsc::Sender<RawDelivery>> {
        self.inboxes.read().get(to).cloned()
    }
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageChannel for InMemoryNetwork {
    async fn send(
        &self,
        from: &PartyName,
        to: &PartyName,
        message: ProtocolMessage,
        deadline: Instant,
    ) -> Result<ProtocolMessage, ChannelError> {
        let kind = message.kind();
        let envelope = Envelope::new(from.clone(), to.clone(), message);
        let bytes = envelope.encode()?;

        let inbox = self.inbox(to).ok_or_else(|| ChannelError::Unreachable {
            party: to.clone(),
            reason: "no route to party".to_string(),
        })?;

        match self.fault(from, to) {
            Some(LinkFault::Partitioned) => {
                return Err(ChannelError::Unreachable {
                    party: to.clone(),
                    reason: "link partitioned".to_string(),
                });
            }
            Some(LinkFault::Drop) => {
                sleep_until(deadline).await;
                return Err(ChannelError::Timeout { party: to.clone() });
            }
            Some(LinkFault::Delay(delay)) => {
                if Instant::now() + delay >= deadline {
                    sleep_until(deadline).await;
                    return Err(ChannelError::Timeout { party: to.clone() });
                }
                sleep(delay).await;
            }
            None => {}
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let delivery = RawDelivery {
            bytes,
            deadline,
            reply: reply_tx,
        };

        match timeout_at(deadline, inbox.send(delivery)).await {
            Err(_) => return Err(ChannelError::Timeout { party: to.clone() }),
            Ok(Err(_)) => {
                return Err(ChannelError::Unreachable {
                    party: to.clone(),
                    reason: "mailbox closed".to_string(),
                })
            }
            Ok(Ok(())) => {}
        }
        self.delivered.fetch_add(1, Ordering::Relaxed);
        debug!(from = %from, to = %to, kind, "Envelope delivered");

        let reply_bytes = match timeout_at(deadline, reply_rx).await {
            Err(_) => return Err(ChannelError::Timeout { party: to.clone() }),
            Ok(Err(_)) => {
                return Err(ChannelError::Unreachable {
                    party: to.clone(),
                    reason: "delivery refused".to_string(),
                })
            }
            Ok(Ok(bytes)) => bytes,
        };

        let reply = Envelope::<ProtocolMessage>::decode(&reply_bytes)?;
        if reply.correlation_id != envelope.correlation_id || reply.sender != *to {
            return Err(ChannelError::MismatchedReply {
                party: to.clone(),
                reason: format!(
                    "expected correlation {} from {}, got {} from {}",
                    envelope.correlation_id, to, reply.correlation_id, reply.sender
                ),
            });
        }
        Ok(reply.payload)
    }
}
