//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the registry port.

mod memory;

pub use memory::InMemoryPartyRegistry;
