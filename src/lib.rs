//! Order relay client
//!
//! Fetches, decodes, verifies and streams off-chain maker/taker orders:
//! - `order` - 441-byte codec, JSON form, Keccak-256 identity, signatures
//! - `stream` - orderbook subscription state machine and local mirror
//! - `relay` - REST endpoints with retry and rate-limit headers
//! - `tokens` - symbol <-> address registry for display
//! - `config` - YAML configuration, env defaults, logging

pub mod config;
pub mod error;
pub mod order;
pub mod relay;
pub mod shared;
pub mod stream;
pub mod tokens;

pub use error::AppError;
