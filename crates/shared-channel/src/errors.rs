//! # Channel Errors

use crate::nonce_cache::NonceError;
use shared_types::{CodecError, PartyName};
use thiserror::Error;

/// Errors surfaced by `MessageChannel::send`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// No route to the recipient, or the recipient refused the delivery.
    #[error("Party {party} unreachable: {reason}")]
    Unreachable { party: PartyName, reason: String },

    /// No reply arrived before the deadline.
    #[error("Timed out waiting for {party}")]
    Timeout { party: PartyName },

    /// Wire data could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The reply did not belong to the request.
    #[error("Mismatched reply from {party}: {reason}")]
    MismatchedReply { party: PartyName, reason: String },

    /// The requester stopped waiting before the reply was sent.
    #[error("Requester {party} no longer waiting for reply")]
    ReplyDropped { party: PartyName },
}

impl ChannelError {
    /// Whether the caller may retry the whole exchange.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }
}

/// Why a mailbox refused to hand an envelope to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeRejection {
    /// Unknown protocol version.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// Envelope addressed to another party.
    #[error("Envelope for {recipient} delivered to {owner}")]
    WrongRecipient { recipient: PartyName, owner: PartyName },

    /// Stale, future-dated or replayed envelope.
    #[error(transparent)]
    Freshness(#[from] NonceError),
}
