//! # Domain Module
//!
//! Registry domain types.

pub mod errors;

pub use errors::*;
