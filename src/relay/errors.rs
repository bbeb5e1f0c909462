//! REST relay error types

use thiserror::Error;

/// Errors returned by [`super::RelayClient`]
#[derive(Error, Debug)]
pub enum RelayError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay answered with a non-success status
    #[error("Relay returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not decode
    #[error("Decode error on {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Query rejected before sending
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl RelayError {
    /// Connection errors, timeouts, 429 and 5xx other than 501 are retried
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Http(e) => e.is_connect() || e.is_timeout(),
            RelayError::Status { status, .. } => {
                *status == 429 || ((500..600).contains(status) && *status != 501)
            }
            RelayError::Decode { .. } | RelayError::InvalidQuery(_) => false,
        }
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> RelayError {
        RelayError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_status_display() {
        let err = RelayError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Relay returned status 404: not found");
    }

    #[test]
    fn test_retryable_statuses() {
        for code in [429u16, 500, 502, 503, 504, 599] {
            assert!(status(code).is_retryable(), "{}", code);
        }
    }

    #[test]
    fn test_non_retryable_statuses() {
        for code in [400u16, 401, 404, 501] {
            assert!(!status(code).is_retryable(), "{}", code);
        }
        assert!(!RelayError::InvalidQuery("x".into()).is_retryable());
    }
}
