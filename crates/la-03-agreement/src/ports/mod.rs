//! # Ports Layer
//!
//! - **Inbound (Driving)**: `AgreementApi`, what a party can do
//! - **Outbound (Driven)**: `ProposalValidator`, the local acceptance policy

pub mod inbound;
pub mod outbound;

pub use inbound::AgreementApi;
pub use outbound::ProposalValidator;
