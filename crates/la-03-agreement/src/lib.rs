//! # LA-03 Agreement Protocol
//!
//! Proposal, unanimous acknowledgement and atomic commit of one shared record
//! across every participant's state store.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Protocol
//!
//! ```text
//! Drafting ──→ Proposed ──→ Acknowledged ──→ Committed
//!    │            │              │
//!    └────────────┴──────────────┴──────→ Aborted
//! ```
//!
//! 1. The initiator drafts a record with a fresh `LinearId` and sends a
//!    proposal to every other participant, concurrently.
//! 2. Each counterparty checks well-formedness, runs its `ProposalValidator`,
//!    stages the record on accept and replies with an ack.
//! 3. After unanimous accept, counterparties commit their staged record, then
//!    the initiator commits locally.
//! 4. Any rejection or channel failure aborts the exchange. Counterparties that
//!    staged the record get a best-effort abort notice.
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | No commit without unanimous ack | Commit only follows an all-accept round |
//! | No mutation after timeout | Deliveries past their deadline are never applied |
//! | No disagreement on a `LinearId` | Store commit contract: identical is a no-op, differing fails |
//!
//! ## Module Structure
//!
//! ```text
//! la-03-agreement/
//! ├── domain/     # AgreementState, AgreementSession, invariants, errors
//! ├── ports/      # AgreementApi, ProposalValidator
//! ├── adapters/   # AcceptWellFormed, FnValidator
//! └── service.rs  # AgreementService
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{AcceptWellFormed, FnValidator};
pub use domain::{
    AgreementConfig, AgreementError, AgreementSession, AgreementState, ProposalRequest,
    ProposalViolation,
};
pub use ports::{AgreementApi, ProposalValidator};
pub use service::AgreementService;
