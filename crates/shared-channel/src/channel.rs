//! # Message Channel Port
//!
//! Defines the sending side of party-to-party communication.

use crate::errors::ChannelError;
use async_trait::async_trait;
use shared_types::{PartyName, ProtocolMessage};
use tokio::time::Instant;

/// Reliable point-to-point request/response delivery.
///
/// Guarantees:
/// - at most one delivery per call (no retries inside the channel)
/// - content preserved exactly
/// - no ordering between distinct `send` calls
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Deliver `message` from `from` to `to` and wait for the correlated reply.
    ///
    /// # Errors
    ///
    /// - `ChannelError::Unreachable` - no route, or the recipient refused it
    /// - `ChannelError::Timeout` - no reply before `deadline`
    async fn send(
        &self,
        from: &PartyName,
        to: &PartyName,
        message: ProtocolMessage,
        deadline: Instant,
    ) -> Result<ProtocolMessage, ChannelError>;
}
