//! Relay REST types
//!
//! Query parameter sets for each endpoint and the decoded response bodies.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::order::{Address, ApiOrder, DecodeResult, Order, Uint256};

pub const HEADER_RATE_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_RATE_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RATE_RESET: &str = "X-RateLimit-Reset";

// =============================================================================
// Queries
// =============================================================================

/// `/token_pairs` filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_a: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_b: Option<Address>,
}

/// `/orders` filters; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    #[serde(rename = "exchangeContractAddress", skip_serializing_if = "Option::is_none")]
    pub exchange_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
    #[serde(rename = "makerTokenAddress", skip_serializing_if = "Option::is_none")]
    pub maker_token: Option<Address>,
    #[serde(rename = "takerTokenAddress", skip_serializing_if = "Option::is_none")]
    pub taker_token: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_a: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_b: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trader: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_recipient: Option<Address>,
}

/// `/orderbook` parameters; both addresses are required by the relay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderbookQuery {
    #[serde(rename = "baseTokenAddress", skip_serializing_if = "Option::is_none")]
    pub base: Option<Address>,
    #[serde(rename = "quoteTokenAddress", skip_serializing_if = "Option::is_none")]
    pub quote: Option<Address>,
}

impl OrderbookQuery {
    pub fn new(base: Address, quote: Address) -> Self {
        Self {
            base: Some(base),
            quote: Some(quote),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Token as listed in `/token_pairs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub min_amount: Uint256,
    pub max_amount: Uint256,
    pub precision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token_a: Token,
    pub token_b: Token,
}

/// Orderbook body in transport form, shared by `/orderbook` and stream snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOrderbook {
    #[serde(default)]
    pub bids: Vec<ApiOrder>,
    #[serde(default)]
    pub asks: Vec<ApiOrder>,
}

impl ApiOrderbook {
    pub fn to_orderbook(&self) -> DecodeResult<Orderbook> {
        Ok(Orderbook {
            bids: self.bids.iter().map(ApiOrder::to_order).collect::<DecodeResult<_>>()?,
            asks: self.asks.iter().map(ApiOrder::to_order).collect::<DecodeResult<_>>()?,
        })
    }
}

/// Decoded orderbook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Orderbook {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
}

/// Rate-limit state reported by the relay on every response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimit {
    /// Parse the `X-RateLimit-*` headers; absent or unparsable values stay `None`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);

        Self {
            limit: read(HEADER_RATE_LIMIT).and_then(|v| v.parse().ok()),
            remaining: read(HEADER_RATE_REMAINING).and_then(|v| v.parse().ok()),
            reset: read(HEADER_RATE_RESET)
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|secs| *secs != 0)
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    /// True when the relay reported no requests left in the window
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Decoded body plus the rate-limit headers that came with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse<T> {
    pub data: T,
    pub rate_limit: RateLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_RATE_LIMIT, HeaderValue::from_static("60"));
        headers.insert(HEADER_RATE_REMAINING, HeaderValue::from_static("0"));
        headers.insert(HEADER_RATE_RESET, HeaderValue::from_static("1518201120"));

        let rate = RateLimit::from_headers(&headers);
        assert_eq!(rate.limit, Some(60));
        assert_eq!(rate.remaining, Some(0));
        assert_eq!(rate.reset.map(|t| t.timestamp()), Some(1518201120));
        assert!(rate.is_exhausted());
    }

    #[test]
    fn test_rate_limit_missing_or_garbage_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_RATE_LIMIT, HeaderValue::from_static("lots"));
        headers.insert(HEADER_RATE_RESET, HeaderValue::from_static("0"));

        let rate = RateLimit::from_headers(&headers);
        assert_eq!(rate, RateLimit::default());
        assert!(!rate.is_exhausted());
    }

    #[test]
    fn test_orders_query_serializes_only_set_fields() {
        let query = OrdersQuery {
            maker_token: Some(Address::from_bytes([0xaa; 20])),
            trader: Some(Address::from_bytes([0xbb; 20])),
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["makerTokenAddress"], format!("0x{}", "aa".repeat(20)));
        assert_eq!(obj["trader"], format!("0x{}", "bb".repeat(20)));
    }

    #[test]
    fn test_token_pair_parses() {
        let json = r#"{
            "tokenA": {"address": "0xe41d2489571d322189246dafa5ebde1f4699f498", "minAmount": "1", "maxAmount": "1000000000000000000000", "precision": 5},
            "tokenB": {"address": "0x2956356cd2a2bf3202f771f50d3d14a367b48070", "minAmount": "0", "maxAmount": "50", "precision": 18}
        }"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.token_a.precision, 5);
        assert_eq!(pair.token_a.max_amount.to_string(), "1000000000000000000000");
        assert_eq!(pair.token_b.address.to_hex(), "0x2956356cd2a2bf3202f771f50d3d14a367b48070");
    }
}
