//! Order identity hashing
//!
//! The order hash is Keccak-256 over the raw bytes of twelve fields in a
//! fixed order. The order of writes below is part of the relay protocol:
//! reordering changes every hash and breaks interoperability.

use sha3::{Digest, Keccak256};

use super::types::OrderTerms;

/// Number of bytes fed into the order hash (6 addresses + 6 amounts)
pub const HASH_INPUT_LEN: usize = 6 * 20 + 6 * 32;

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

/// Compute the canonical order hash
pub fn order_hash(terms: &OrderTerms) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(terms.exchange_address.as_bytes());
    hasher.update(terms.maker.as_bytes());
    hasher.update(terms.taker.as_bytes());
    hasher.update(terms.maker_token.as_bytes());
    hasher.update(terms.taker_token.as_bytes());
    hasher.update(terms.fee_recipient.as_bytes());
    hasher.update(terms.maker_amount.as_bytes());
    hasher.update(terms.taker_amount.as_bytes());
    hasher.update(terms.maker_fee.as_bytes());
    hasher.update(terms.taker_fee.as_bytes());
    hasher.update(terms.expiration_timestamp.as_bytes());
    hasher.update(terms.salt.as_bytes());
    hasher.finalize().into()
}
