//! # Node Runtime Library
//!
//! Wires Ledger-Accord parties together in one process. The main entry point
//! is the `main.rs` binary; tests use the `Driver` directly.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and the per-party node
//! - `adapters/` - configured store backend
//! - `driver` - starts parties on a shared in-memory network
//! - `telemetry` - `tracing` subscriber setup

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod driver;
pub mod telemetry;

pub use container::{ConfigError, NodeConfig, PartyNode, PartyService};
pub use driver::{run_demo, DemoReport, Driver};
pub use telemetry::{init_telemetry, init_test_telemetry};
