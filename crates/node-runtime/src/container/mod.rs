//! # Party Container
//!
//! Holds one party's wired services with proper lifetime management.
//!
//! - Each party owns its store and its mailbox; nothing is shared between
//!   parties except the network
//! - The inbound loop runs until shutdown is signalled or the mailbox closes

pub mod config;
pub mod party;

pub use config::{ConfigError, NodeConfig};
pub use party::{PartyNode, PartyService};
