//! # LA-01 Party Registry
//!
//! Resolves participant names to addressable identities.
//!
//! **Architecture:** Hexagonal (domain + ports/adapters)
//!
//! ## Purpose
//!
//! - Read-mostly network map populated once at startup
//! - `resolve(name)` is a pure lookup with no side effects
//! - Names and addresses are both unique within one registry
//!
//! ## Module Structure
//!
//! ```text
//! la-01-party-registry/
//! ├── domain/     # RegistryError
//! ├── ports/      # PartyRegistry trait
//! └── adapters/   # InMemoryPartyRegistry
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::InMemoryPartyRegistry;
pub use domain::RegistryError;
pub use ports::PartyRegistry;
