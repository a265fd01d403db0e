//! # LA-02 State Store
//!
//! Per-party store of agreed `SharedStateRecord`s (the party's ledger).
//!
//! ## Role in System
//!
//! - **Sole mutator:** `commit`, durable on return
//! - **Append-only:** records are never changed or removed
//! - **Idempotent:** committing an identical record again is a no-op
//! - **Conflict-safe:** a differing record under an existing id fails with
//!   `DuplicateLinearId`, so the first committer wins
//!
//! ## Adapters
//!
//! | Adapter | Durability |
//! |---------|------------|
//! | `InMemoryStateStore` | process lifetime |
//! | `FileStateStore` | JSON-lines journal, fsync per commit, exclusive file lock |

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
