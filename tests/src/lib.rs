//! # Ledger-Accord Test Suite
//!
//! Cross-crate scenarios driven through `node_runtime::Driver`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── agreement_flows.rs   # convergence, rejection, timeout, unreachable
//!     ├── concurrency.rs       # many agreements in flight at once
//!     └── durability.rs        # file journals and tracking streams
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p la-tests
//! cargo test -p la-tests integration::durability
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
