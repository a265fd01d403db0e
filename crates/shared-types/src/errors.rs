//! # Error Types
//!
//! Errors shared by every crate that touches the wire format.

use thiserror::Error;

/// Errors raised while encoding or decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value could not be serialized.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Bytes could not be deserialized.
    #[error("Decode failed: {0}")]
    Decode(String),
}
