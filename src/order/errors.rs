//! Order decoding error types
//!
//! Every malformed value is rejected with a `DecodeError` naming the field
//! it came from, so a caller can drop the one bad order and keep going.

use thiserror::Error;

/// Errors raised while turning external data into order values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Hex payload could not be decoded
    #[error("Invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    /// Decoded value has the wrong number of bytes
    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Decimal string is empty or contains non-digit characters
    #[error("Invalid integer in {field}: {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    /// Decimal string does not fit in 256 bits
    #[error("Integer overflow in {field}: value exceeds 2^256-1")]
    Overflow { field: &'static str },
}

/// Result type alias for decode operations
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
