//! # Shared Types Crate
//!
//! Domain entities, protocol messages, and the `Envelope<T>` wrapper shared by
//! every Ledger-Accord crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: everything that crosses a party boundary is defined here.
//! - **Envelope Integrity**: `Envelope<T>` is the sole wrapper for party-to-party traffic.
//! - **No Redundant Identity**: payloads never carry a sender field; the
//!   envelope's `sender` is authoritative.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::Envelope;
pub use errors::*;
pub use ipc::*;
