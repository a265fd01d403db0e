//! # `Envelope` Wrapper
//!
//! The wrapper for every message exchanged between parties.
//!
//! ## Properties
//!
//! - **Versioning**: every envelope carries a `version` for forward compatibility.
//! - **Correlation**: a reply reuses the `correlation_id` of its request.
//! - **Time-Bounded Replay Prevention**: nonces are only valid within the timestamp window.
//! - **Envelope Authority**: `sender` is the sole source of truth for identity.
//!   Payloads never repeat it.

use crate::entities::PartyName;
use crate::errors::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// The message envelope for all party-to-party communication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    // =========================================================================
    // HEADER SECTION
    // =========================================================================
    /// Protocol version. Checked by the receiver before processing.
    pub version: u16,

    /// The party that sent this envelope.
    pub sender: PartyName,

    /// The party this envelope is addressed to.
    pub recipient: PartyName,

    /// Correlates a reply with its request.
    pub correlation_id: Uuid,

    // =========================================================================
    // FRESHNESS SECTION
    // =========================================================================
    /// Unix timestamp (seconds) at creation.
    /// Valid window: `now - MAX_AGE <= timestamp <= now + MAX_FUTURE_SKEW`.
    pub timestamp: u64,

    /// Unique per envelope. A nonce is accepted at most once.
    pub nonce: Uuid,

    // =========================================================================
    // PAYLOAD SECTION
    // =========================================================================
    /// The message payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Maximum allowed clock skew for future timestamps (seconds).
    pub const MAX_FUTURE_SKEW: u64 = 10;

    /// Maximum age for valid timestamps (seconds).
    pub const MAX_AGE: u64 = 60;

    /// Wrap a request payload with a fresh correlation id.
    pub fn new(sender: PartyName, recipient: PartyName, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            sender,
            recipient,
            correlation_id: Uuid::new_v4(),
            timestamp: unix_now(),
            nonce: Uuid::new_v4(),
            payload,
        }
    }

    /// Build the reply to this envelope, keeping its correlation id.
    pub fn reply<U>(&self, payload: U) -> Envelope<U> {
        Envelope {
            version: Self::CURRENT_VERSION,
            sender: self.recipient.clone(),
            recipient: self.sender.clone(),
            correlation_id: self.correlation_id,
            timestamp: unix_now(),
            nonce: Uuid::new_v4(),
            payload,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode from wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Current Unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_swaps_parties_and_keeps_correlation() {
        let request = Envelope::new(PartyName::new("PartyA"), PartyName::new("PartyB"), 7u32);
        let reply = request.reply("ok".to_string());

        assert_eq!(reply.sender, request.recipient);
        assert_eq!(reply.recipient, request.sender);
        assert_eq!(reply.correlation_id, request.correlation_id);
        assert_ne!(reply.nonce, request.nonce);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = Envelope::<String>::decode(&[0xFF, 0x01]);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
