//! # Ports Module
//!
//! Inbound API of the registry.

pub mod inbound;

pub use inbound::PartyRegistry;
