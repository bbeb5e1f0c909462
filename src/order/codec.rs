//! Fixed-width binary order codec
//!
//! Every order encodes to exactly 441 bytes. The byte ranges below are the
//! wire layout consumers use to reproduce and verify order hashes.

use std::ops::Range;

use super::errors::{DecodeError, DecodeResult};
use super::types::{Address, Order, OrderTerms, Signature, Uint256};

/// Encoded order width in bytes
pub const ORDER_LEN: usize = 441;

const EXCHANGE_ADDRESS: Range<usize> = 0..20;
const MAKER: Range<usize> = 20..40;
const TAKER: Range<usize> = 40..60;
const MAKER_TOKEN: Range<usize> = 60..80;
const TAKER_TOKEN: Range<usize> = 80..100;
const FEE_RECIPIENT: Range<usize> = 100..120;
const MAKER_AMOUNT: Range<usize> = 120..152;
const TAKER_AMOUNT: Range<usize> = 152..184;
const MAKER_FEE: Range<usize> = 184..216;
const TAKER_FEE: Range<usize> = 216..248;
const EXPIRATION: Range<usize> = 248..280;
const SALT: Range<usize> = 280..312;
const SIG_V: usize = 312;
const SIG_R: Range<usize> = 313..345;
const SIG_S: Range<usize> = 345..377;
const TAKER_AMOUNT_FILLED: Range<usize> = 377..409;
const TAKER_AMOUNT_CANCELLED: Range<usize> = 409..441;

/// Encode an order into its 441-byte wire form
pub fn encode(order: &Order) -> [u8; ORDER_LEN] {
    let terms = order.terms();
    let sig = order.signature();
    let mut out = [0u8; ORDER_LEN];

    out[EXCHANGE_ADDRESS].copy_from_slice(terms.exchange_address.as_bytes());
    out[MAKER].copy_from_slice(terms.maker.as_bytes());
    out[TAKER].copy_from_slice(terms.taker.as_bytes());
    out[MAKER_TOKEN].copy_from_slice(terms.maker_token.as_bytes());
    out[TAKER_TOKEN].copy_from_slice(terms.taker_token.as_bytes());
    out[FEE_RECIPIENT].copy_from_slice(terms.fee_recipient.as_bytes());
    out[MAKER_AMOUNT].copy_from_slice(terms.maker_amount.as_bytes());
    out[TAKER_AMOUNT].copy_from_slice(terms.taker_amount.as_bytes());
    out[MAKER_FEE].copy_from_slice(terms.maker_fee.as_bytes());
    out[TAKER_FEE].copy_from_slice(terms.taker_fee.as_bytes());
    out[EXPIRATION].copy_from_slice(terms.expiration_timestamp.as_bytes());
    out[SALT].copy_from_slice(terms.salt.as_bytes());
    out[SIG_V] = sig.v();
    out[SIG_R].copy_from_slice(sig.r());
    out[SIG_S].copy_from_slice(sig.s());
    out[TAKER_AMOUNT_FILLED].copy_from_slice(order.taker_amount_filled().as_bytes());
    out[TAKER_AMOUNT_CANCELLED].copy_from_slice(order.taker_amount_cancelled().as_bytes());

    out
}

/// Decode a 441-byte blob; any other length is rejected
pub fn decode(data: &[u8]) -> DecodeResult<Order> {
    if data.len() != ORDER_LEN {
        return Err(DecodeError::InvalidLength {
            field: "order",
            expected: ORDER_LEN,
            actual: data.len(),
        });
    }

    let terms = OrderTerms {
        exchange_address: address_at(data, EXCHANGE_ADDRESS),
        maker: address_at(data, MAKER),
        taker: address_at(data, TAKER),
        maker_token: address_at(data, MAKER_TOKEN),
        taker_token: address_at(data, TAKER_TOKEN),
        fee_recipient: address_at(data, FEE_RECIPIENT),
        maker_amount: uint_at(data, MAKER_AMOUNT),
        taker_amount: uint_at(data, TAKER_AMOUNT),
        maker_fee: uint_at(data, MAKER_FEE),
        taker_fee: uint_at(data, TAKER_FEE),
        expiration_timestamp: uint_at(data, EXPIRATION),
        salt: uint_at(data, SALT),
    };
    let signature = Signature::new(data[SIG_V], word_at(data, SIG_R), word_at(data, SIG_S));

    Ok(Order::new(
        terms,
        signature,
        uint_at(data, TAKER_AMOUNT_FILLED),
        uint_at(data, TAKER_AMOUNT_CANCELLED),
    ))
}

// Callers have already checked the blob length, so the ranges are in bounds.
fn address_at(data: &[u8], range: Range<usize>) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&data[range]);
    Address::from_bytes(bytes)
}

fn word_at(data: &[u8], range: Range<usize>) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data[range]);
    bytes
}

fn uint_at(data: &[u8], range: Range<usize>) -> Uint256 {
    Uint256::from_bytes(word_at(data, range))
}

impl Order {
    /// 441-byte wire encoding
    pub fn to_bytes(&self) -> [u8; ORDER_LEN] {
        encode(self)
    }

    pub fn from_bytes(data: &[u8]) -> DecodeResult<Self> {
        decode(data)
    }
}
