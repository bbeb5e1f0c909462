//! REST access to the order relay
//!
//! This module is organized into submodules:
//! - `client` - `RelayClient` with retry and rate-limit parsing
//! - `types` - query parameter sets and response bodies
//! - `errors` - `RelayError`

pub mod client;
pub mod errors;
pub mod types;

pub use client::RelayClient;
pub use errors::{RelayError, RelayResult};
pub use types::{
    ApiOrderbook, Orderbook, OrderbookQuery, OrdersQuery, PairsQuery, RateLimit, RelayResponse,
    Token, TokenPair,
};
