//! Order value types
//!
//! Addresses and 256-bit amounts are validated once when parsed and are
//! immutable afterwards. An `Order` caches its identity hash at construction
//! and exposes no setters, so the hash always matches the hashed fields.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::errors::{DecodeError, DecodeResult};
use super::hashing::order_hash;

/// Decode a hex string with an optional `0x`/`0X` prefix
pub(crate) fn decode_hex(field: &'static str, value: &str) -> DecodeResult<Vec<u8>> {
    let trimmed = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(trimmed).map_err(|e| DecodeError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

/// Decode a hex string into exactly `N` bytes
pub(crate) fn decode_hex_fixed<const N: usize>(
    field: &'static str,
    value: &str,
) -> DecodeResult<[u8; N]> {
    let bytes = decode_hex(field, value)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| DecodeError::InvalidLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

// =============================================================================
// Address
// =============================================================================

/// 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// Width of an address in bytes
    pub const LEN: usize = 20;

    /// The all-zero address
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed (or bare) 40-digit hex string
    pub fn parse(value: &str) -> DecodeResult<Self> {
        Self::parse_field("address", value)
    }

    pub(crate) fn parse_field(field: &'static str, value: &str) -> DecodeResult<Self> {
        decode_hex_fixed::<20>(field, value).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Canonical lowercase `0x` form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

// =============================================================================
// Uint256
// =============================================================================

/// Unsigned 256-bit integer stored as 32 big-endian bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uint256([u8; 32]);

impl Uint256 {
    /// Width in bytes
    pub const LEN: usize = 32;

    pub const ZERO: Uint256 = Uint256([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_u256(U256::from(value))
    }

    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        Self(bytes)
    }

    /// Parse a base-10 string of ASCII digits
    pub fn parse_decimal(value: &str) -> DecodeResult<Self> {
        Self::parse_field("amount", value)
    }

    pub(crate) fn parse_field(field: &'static str, value: &str) -> DecodeResult<Self> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidInteger {
                field,
                value: value.to_string(),
            });
        }
        let parsed = U256::from_dec_str(value).map_err(|_| DecodeError::Overflow { field })?;
        Ok(Self::from_u256(parsed))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl FromStr for Uint256 {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl TryFrom<String> for Uint256 {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_decimal(&value)
    }
}

impl From<Uint256> for String {
    fn from(value: Uint256) -> Self {
        value.to_string()
    }
}

impl From<u64> for Uint256 {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u256())
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self.to_u256())
    }
}

// =============================================================================
// Signature
// =============================================================================

/// ECDSA signature over an order hash, with the hash it covers
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    v: u8,
    r: [u8; 32],
    s: [u8; 32],
    hash: [u8; 32],
}

impl Signature {
    /// Build a signature that is not yet bound to an order hash
    pub const fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self {
            v,
            r,
            s,
            hash: [0u8; 32],
        }
    }

    /// Attach the order hash this signature is claimed to cover
    pub(crate) fn bound_to(self, hash: [u8; 32]) -> Self {
        Self { hash, ..self }
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Order hash cached when the owning order was constructed
    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Recovery id (0 or 1) for `v` in {27, 28}
    pub fn recovery_id(&self) -> Option<u8> {
        match self.v {
            27 | 28 => Some(self.v - 27),
            _ => None,
        }
    }

    /// Check that `signer` produced this signature over the cached hash
    pub fn verify(&self, signer: &Address) -> bool {
        super::signing::verify(self, &self.hash, signer)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("v", &self.v)
            .field("r", &format_args!("0x{}", hex::encode(self.r)))
            .field("s", &format_args!("0x{}", hex::encode(self.s)))
            .field("hash", &format_args!("0x{}", hex::encode(self.hash)))
            .finish()
    }
}

// =============================================================================
// Order
// =============================================================================

/// The twelve fields covered by the order hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OrderTerms {
    pub exchange_address: Address,
    pub maker: Address,
    pub taker: Address,
    pub maker_token: Address,
    pub taker_token: Address,
    pub fee_recipient: Address,
    pub maker_amount: Uint256,
    pub taker_amount: Uint256,
    pub maker_fee: Uint256,
    pub taker_fee: Uint256,
    pub expiration_timestamp: Uint256,
    pub salt: Uint256,
}

impl OrderTerms {
    /// Keccak-256 identity hash of these terms
    pub fn hash(&self) -> [u8; 32] {
        order_hash(self)
    }
}

/// A signed maker order as circulated by the relay
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    terms: OrderTerms,
    signature: Signature,
    taker_amount_filled: Uint256,
    taker_amount_cancelled: Uint256,
}

impl Order {
    /// Assemble an order and bind `signature` to the hash of `terms`
    pub fn new(
        terms: OrderTerms,
        signature: Signature,
        taker_amount_filled: Uint256,
        taker_amount_cancelled: Uint256,
    ) -> Self {
        let hash = terms.hash();
        Self {
            terms,
            signature: signature.bound_to(hash),
            taker_amount_filled,
            taker_amount_cancelled,
        }
    }

    pub fn terms(&self) -> &OrderTerms {
        &self.terms
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Order identity: Keccak-256 over the hashed terms
    pub fn hash(&self) -> &[u8; 32] {
        self.signature.hash()
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash()))
    }

    pub fn taker_amount_filled(&self) -> Uint256 {
        self.taker_amount_filled
    }

    pub fn taker_amount_cancelled(&self) -> Uint256 {
        self.taker_amount_cancelled
    }

    /// Taker amount still available after fills and cancellations
    pub fn remaining_taker_amount(&self) -> Uint256 {
        let remaining = self
            .terms
            .taker_amount
            .to_u256()
            .saturating_sub(self.taker_amount_filled.to_u256())
            .saturating_sub(self.taker_amount_cancelled.to_u256());
        Uint256::from_u256(remaining)
    }

    /// Check the signature against an arbitrary signer
    pub fn verify_signature(&self, signer: &Address) -> bool {
        self.signature.verify(signer)
    }

    /// Check the signature against the order's own maker
    pub fn is_signed_by_maker(&self) -> bool {
        self.signature.verify(&self.terms.maker)
    }
}

/// Book side of an order relative to the subscribed base token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// An order selling the base token is an ask; anything else is a bid
    pub fn classify(order: &Order, base_token: &Address) -> Self {
        if order.terms().maker_token == *base_token {
            Side::Ask
        } else {
            Side::Bid
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "Bid"),
            Side::Ask => write!(f, "Ask"),
        }
    }
}
