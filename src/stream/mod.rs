//! Streaming orderbook client
//!
//! This module is organized into submodules:
//! - `session` - connection/subscription state machine
//! - `transport` - transport traits and the WebSocket implementation
//! - `messages` - subscribe request and inbound frame decoding
//! - `mirror` - local bid/ask copy
//! - `errors` - `StreamError` and close-code classification

pub mod errors;
pub mod messages;
pub mod mirror;
pub mod session;
pub mod transport;

pub use errors::{StreamError, StreamResult, DEFAULT_RECOVERABLE_CLOSE_CODES};
pub use messages::{decode_frame, InboundFrame, SubscribeRequest};
pub use mirror::OrderbookMirror;
pub use session::{SessionConfig, StreamEvent, StreamSession, StreamState};
pub use transport::{Connector, FrameTransport, WsConnector};
