//! # Adapter Implementations
//!
//! Concrete implementations the runtime plugs into subsystem ports.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                OUTER LAYER (Adapters)                     │
//! │   PartyStore (memory | file)                              │
//! │                     ↑ implements ↑                        │
//! │                MIDDLE LAYER (Ports)                       │
//! │   trait StateStore                                        │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod party_store;

pub use party_store::PartyStore;
