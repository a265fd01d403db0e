//! # Domain Layer
//!
//! Agreement sessions, their state machine, and proposal well-formedness.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use entities::{AgreementSession, ProposalRequest, SessionTable, StagedRecord};
pub use errors::{AgreementError, ProposalViolation};
pub use invariants::check_well_formed;
pub use value_objects::{AgreementConfig, AgreementState};
