//! Application-wide error types using thiserror
//!
//! Module errors (`DecodeError`, `StreamError`, `RelayError`) convert into
//! `AppError` so callers can use one `Result` alias at the crate boundary.

use thiserror::Error;

use crate::order::DecodeError;
use crate::relay::RelayError;
use crate::stream::StreamError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("no pairs".to_string());
        assert_eq!(err.to_string(), "Configuration error: no pairs");
    }

    #[test]
    fn test_from_decode_error() {
        let err: AppError = DecodeError::Overflow { field: "salt" }.into();
        assert!(matches!(err, AppError::Decode(_)));
        assert!(err.to_string().starts_with("Decode error:"));
    }

    #[test]
    fn test_from_stream_error() {
        let err: AppError = StreamError::Closed { code: 4000 }.into();
        assert_eq!(err.to_string(), "Stream error: Connection closed with code 4000");
    }

    #[test]
    fn test_from_relay_error() {
        let err: AppError = RelayError::InvalidQuery("missing base".into()).into();
        assert!(matches!(err, AppError::Relay(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
