//! # Shared Channel - Point-to-Point Messaging Between Parties
//!
//! The only way parties talk to each other. No party ever touches another
//! party's state directly; everything goes through a request/response
//! exchange on this channel.
//!
//! ```text
//! ┌──────────────┐   send(from, to, msg, deadline)   ┌──────────────┐
//! │   Party A    │ ────────────────────────────────→ │   Mailbox B  │
//! │              │ ←──────────── reply ───────────── │ (recv loop)  │
//! └──────────────┘                                   └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **At most once:** one delivery per call, duplicates dropped by the nonce cache
//! - **Deadline bound:** a delivery whose deadline passed is never handed out
//! - **Lossless:** envelopes cross the link as bincode bytes and decode to the same value

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod errors;
pub mod mailbox;
pub mod network;
pub mod nonce_cache;

// Re-export main types
pub use channel::MessageChannel;
pub use errors::{ChannelError, EnvelopeRejection};
pub use mailbox::{Delivery, Mailbox};
pub use network::{InMemoryNetwork, LinkFault, NetworkStats};
pub use nonce_cache::{NonceError, TimeBoundedNonceCache};

/// Maximum deliveries buffered per mailbox before senders wait.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
