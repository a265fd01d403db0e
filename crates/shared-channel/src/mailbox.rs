//! # Mailbox
//!
//! Receiving side of the in-memory network. Each party owns exactly one.

use crate::errors::{ChannelError, EnvelopeRejection};
use crate::nonce_cache::TimeBoundedNonceCache;
use shared_types::{Envelope, PartyName, ProtocolMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Bytes in flight from a sender to a mailbox.
pub(crate) struct RawDelivery {
    pub(crate) bytes: Vec<u8>,
    pub(crate) deadline: Instant,
    pub(crate) reply: oneshot::Sender<Vec<u8>>,
}

/// A verified envelope awaiting its reply.
///
/// Dropping a `Delivery` without responding makes the sender see `Unreachable`.
pub struct Delivery {
    envelope: Envelope<ProtocolMessage>,
    deadline: Instant,
    reply: oneshot::Sender<Vec<u8>>,
}

impl Delivery {
    /// The verified envelope.
    pub fn envelope(&self) -> &Envelope<ProtocolMessage> {
        &self.envelope
    }

    /// Deadline the sender attached to this delivery.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the sender is still waiting and the deadline has not passed.
    ///
    /// Side effects for this delivery must only be applied while this holds.
    pub fn is_live(&self) -> bool {
        Instant::now() < self.deadline && !self.reply.is_closed()
    }

    /// Send the correlated reply.
    pub fn respond(self, message: ProtocolMessage) -> Result<(), ChannelError> {
        let reply = self.envelope.reply(message);
        let bytes = reply.encode()?;
        self.reply
            .send(bytes)
            .map_err(|_| ChannelError::ReplyDropped {
                party: self.envelope.sender.clone(),
            })
    }
}

/// Inbound queue of one party.
pub struct Mailbox {
    owner: PartyName,
    receiver: mpsc::Receiver<RawDelivery>,
    nonce_cache: TimeBoundedNonceCache,
    dead_letters: Arc<AtomicU64>,
}

impl Mailbox {
    pub(crate) fn new(
        owner: PartyName,
        receiver: mpsc::Receiver<RawDelivery>,
        dead_letters: Arc<AtomicU64>,
    ) -> Self {
        Self {
            owner,
            receiver,
            nonce_cache: TimeBoundedNonceCache::new(),
            dead_letters,
        }
    }

    /// The party this mailbox belongs to.
    pub fn owner(&self) -> &PartyName {
        &self.owner
    }

    /// Receive the next verified, still-live delivery.
    ///
    /// # Returns
    ///
    /// - `Some(delivery)` - an envelope that passed verification
    /// - `None` - the network dropped this mailbox
    pub async fn recv(&mut self) -> Option<Delivery> {
        loop {
            let raw = self.receiver.recv().await?;

            if Instant::now() >= raw.deadline || raw.reply.is_closed() {
                debug!(owner = %self.owner, "Discarding expired delivery");
                self.dead_letter();
                continue;
            }

            let envelope = match Envelope::<ProtocolMessage>::decode(&raw.bytes) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(owner = %self.owner, error = %e, "Discarding undecodable delivery");
                    self.dead_letter();
                    continue;
                }
            };

            if let Err(rejection) = self.verify(&envelope) {
                warn!(
                    owner = %self.owner,
                    sender = %envelope.sender,
                    kind = envelope.payload.kind(),
                    error = %rejection,
                    "Envelope rejected"
                );
                self.dead_letter();
                continue;
            }

            return Some(Delivery {
                envelope,
                deadline: raw.deadline,
                reply: raw.reply,
            });
        }
    }

    fn verify(&mut self, envelope: &Envelope<ProtocolMessage>) -> Result<(), EnvelopeRejection> {
        let supported = Envelope::<ProtocolMessage>::CURRENT_VERSION;
        if envelope.version != supported {
            return Err(EnvelopeRejection::UnsupportedVersion {
                received: envelope.version,
                supported,
            });
        }
        if envelope.recipient != self.owner {
            return Err(EnvelopeRejection::WrongRecipient {
                recipient: envelope.recipient.clone(),
                owner: self.owner.clone(),
            });
        }
        self.nonce_cache
            .validate_and_add(envelope.nonce, envelope.timestamp)?;
        Ok(())
    }

    fn dead_letter(&self) {
        self.dead_letters.fetch_add(1, Ordering::Relaxed);
    }
}
