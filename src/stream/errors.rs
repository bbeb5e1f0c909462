//! Stream error types
//!
//! Transport failures are classified against the session's recoverable
//! close-code set; everything else ends the session.

use thiserror::Error;

use crate::order::DecodeError;

/// Close code reported when the peer vanished without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Default set of close codes after which the session reconnects
pub const DEFAULT_RECOVERABLE_CLOSE_CODES: &[u16] = &[
    1000, 1001, 1002, 1003, 1005, 1006, 1007, 1008, 1009, 1010, 1011, 1012, 1013, 1015,
];

/// Errors raised by the orderbook stream
#[derive(Error, Debug)]
pub enum StreamError {
    /// Transport connection could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Handshake did not complete in time
    #[error("Handshake timeout after {0}ms")]
    HandshakeTimeout(u64),

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// Connection closed with the given close code
    #[error("Connection closed with code {code}")]
    Closed { code: u16 },

    /// Frame or payload did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An order inside a frame failed to decode
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Unrecoverable condition; the session is failed
    #[error("Fatal stream error: {0}")]
    Fatal(String),

    /// Reconnect attempts ran out
    #[error("Reconnect attempts exhausted after {attempts} tries: {last_error}")]
    ReconnectExhausted { attempts: u32, last_error: String },
}

impl StreamError {
    /// Close code carried by this error, if any
    pub fn close_code(&self) -> Option<u16> {
        match self {
            StreamError::Closed { code } => Some(*code),
            _ => None,
        }
    }

    /// True if the session should reconnect after this error
    pub fn is_recoverable(&self, recoverable_codes: &[u16]) -> bool {
        self.close_code()
            .map_or(false, |code| recoverable_codes.contains(&code))
    }

    /// True for failures to open a connection
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionFailed(_) | StreamError::HandshakeTimeout(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        StreamError::WebSocket(Box::new(err))
    }
}

/// Result type alias for stream operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;
