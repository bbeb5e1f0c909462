//! Relay order model
//!
//! This module is organized into submodules:
//! - `types` - Address, Uint256, Signature, OrderTerms, Order, Side
//! - `codec` - fixed 441-byte binary layout
//! - `json` - transport string form (`ApiOrder`)
//! - `hashing` - Keccak-256 order identity
//! - `signing` - signature recovery, verification and signing
//! - `errors` - `DecodeError`

pub mod codec;
pub mod errors;
pub mod hashing;
pub mod json;
pub mod signing;
pub mod types;

pub use codec::{decode, encode, ORDER_LEN};
pub use errors::{DecodeError, DecodeResult};
pub use hashing::{keccak256, order_hash};
pub use json::{ApiOrder, ApiSignature, WireV};
pub use signing::{eth_signed_message_digest, recover_signer, sign_order_hash, verify};
pub use types::{Address, Order, OrderTerms, Side, Signature, Uint256};
