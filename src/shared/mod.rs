//! Shared helpers used by both the stream session and the REST client

pub mod reconnect;

pub use reconnect::{retry_with_backoff, BackoffPolicy};
