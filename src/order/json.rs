//! Transport string form of orders
//!
//! REST and WebSocket payloads carry orders with addresses as `0x`-hex,
//! amounts as decimal strings and the signature as `{v, r, s}`. `ApiOrder`
//! mirrors that shape field for field; converting it into an [`Order`]
//! validates every value once.

use serde::{Deserialize, Serialize};

use super::errors::{DecodeError, DecodeResult};
use super::types::{decode_hex_fixed, Address, Order, OrderTerms, Signature, Uint256};

/// Recovery id as it appears on the wire: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireV {
    Number(u64),
    Text(String),
}

impl WireV {
    fn to_byte(&self) -> DecodeResult<u8> {
        let parsed = match self {
            WireV::Number(n) => Some(*n),
            WireV::Text(s) => s.trim().parse::<u64>().ok(),
        };
        parsed
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| DecodeError::InvalidInteger {
                field: "ecSignature.v",
                value: match self {
                    WireV::Number(n) => n.to_string(),
                    WireV::Text(s) => s.clone(),
                },
            })
    }
}

impl Default for WireV {
    fn default() -> Self {
        WireV::Number(0)
    }
}

/// Signature as carried in `ecSignature`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSignature {
    pub v: WireV,
    pub r: String,
    pub s: String,
}

/// Order with every field in its transport string form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrder {
    #[serde(rename = "exchangeContractAddress")]
    pub exchange_address: String,
    pub maker: String,
    pub taker: String,
    #[serde(rename = "makerTokenAddress")]
    pub maker_token: String,
    #[serde(rename = "takerTokenAddress")]
    pub taker_token: String,
    pub fee_recipient: String,
    pub maker_token_amount: String,
    pub taker_token_amount: String,
    pub maker_fee: String,
    pub taker_fee: String,
    #[serde(rename = "expirationUnixTimestampSec")]
    pub expiration_timestamp: String,
    pub salt: String,
    #[serde(rename = "ecSignature")]
    pub signature: ApiSignature,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub taker_token_amount_filled: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub taker_token_amount_cancelled: String,
}

impl ApiOrder {
    /// Validate every field and build the order
    pub fn to_order(&self) -> DecodeResult<Order> {
        let terms = OrderTerms {
            exchange_address: Address::parse_field(
                "exchangeContractAddress",
                &self.exchange_address,
            )?,
            maker: Address::parse_field("maker", &self.maker)?,
            taker: Address::parse_field("taker", &self.taker)?,
            maker_token: Address::parse_field("makerTokenAddress", &self.maker_token)?,
            taker_token: Address::parse_field("takerTokenAddress", &self.taker_token)?,
            fee_recipient: Address::parse_field("feeRecipient", &self.fee_recipient)?,
            maker_amount: Uint256::parse_field("makerTokenAmount", &self.maker_token_amount)?,
            taker_amount: Uint256::parse_field("takerTokenAmount", &self.taker_token_amount)?,
            maker_fee: Uint256::parse_field("makerFee", &self.maker_fee)?,
            taker_fee: Uint256::parse_field("takerFee", &self.taker_fee)?,
            expiration_timestamp: Uint256::parse_field(
                "expirationUnixTimestampSec",
                &self.expiration_timestamp,
            )?,
            salt: Uint256::parse_field("salt", &self.salt)?,
        };

        let signature = Signature::new(
            self.signature.v.to_byte()?,
            decode_hex_fixed::<32>("ecSignature.r", &self.signature.r)?,
            decode_hex_fixed::<32>("ecSignature.s", &self.signature.s)?,
        );

        Ok(Order::new(
            terms,
            signature,
            amount_or_zero("takerTokenAmountFilled", &self.taker_token_amount_filled)?,
            amount_or_zero("takerTokenAmountCancelled", &self.taker_token_amount_cancelled)?,
        ))
    }
}

/// Tracking amounts are optional on the wire; absent means zero
fn amount_or_zero(field: &'static str, value: &str) -> DecodeResult<Uint256> {
    if value.is_empty() {
        Ok(Uint256::ZERO)
    } else {
        Uint256::parse_field(field, value)
    }
}

impl From<&Order> for ApiOrder {
    fn from(order: &Order) -> Self {
        let terms = order.terms();
        let sig = order.signature();
        Self {
            exchange_address: terms.exchange_address.to_hex(),
            maker: terms.maker.to_hex(),
            taker: terms.taker.to_hex(),
            maker_token: terms.maker_token.to_hex(),
            taker_token: terms.taker_token.to_hex(),
            fee_recipient: terms.fee_recipient.to_hex(),
            maker_token_amount: terms.maker_amount.to_string(),
            taker_token_amount: terms.taker_amount.to_string(),
            maker_fee: terms.maker_fee.to_string(),
            taker_fee: terms.taker_fee.to_string(),
            expiration_timestamp: terms.expiration_timestamp.to_string(),
            salt: terms.salt.to_string(),
            signature: ApiSignature {
                v: WireV::Number(u64::from(sig.v())),
                r: format!("0x{}", hex::encode(sig.r())),
                s: format!("0x{}", hex::encode(sig.s())),
            },
            taker_token_amount_filled: order.taker_amount_filled().to_string(),
            taker_token_amount_cancelled: order.taker_amount_cancelled().to_string(),
        }
    }
}

impl From<Order> for ApiOrder {
    fn from(order: Order) -> Self {
        ApiOrder::from(&order)
    }
}

impl TryFrom<ApiOrder> for Order {
    type Error = DecodeError;

    fn try_from(api: ApiOrder) -> Result<Self, Self::Error> {
        api.to_order()
    }
}

impl Serialize for Order {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ApiOrder::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Order {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let api = ApiOrder::deserialize(deserializer)?;
        api.to_order().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Relay-style order payload used across module tests
    pub(crate) const SAMPLE_ORDER_JSON: &str = r#"{
        "exchangeContractAddress": "0x12459c951127e0c374ff9105dda097662a027093",
        "maker": "0x8a4df5ec8b5b3e1a7f0c5d4e9b2c7a6f1e3d5b7a",
        "taker": "0x0000000000000000000000000000000000000000",
        "makerTokenAddress": "0xe41d2489571d322189246dafa5ebde1f4699f498",
        "takerTokenAddress": "0x2956356cd2a2bf3202f771f50d3d14a367b48070",
        "feeRecipient": "0xa258b39954cef5cb142fd567a46cddb31a670124",
        "makerTokenAmount": "18981000000000000",
        "takerTokenAmount": "19000000000000000",
        "makerFee": "0",
        "takerFee": "0",
        "expirationUnixTimestampSec": "1518201120",
        "salt": "58600101225676680041453168589125977076540694791976419610199695339725548478315",
        "ecSignature": {
            "v": 27,
            "r": "0x5c6b1c5e1f3f10b4d0ccde4fa1ef7b0ff9ed7d4d8b7b6e8a5d1e0d0f2a3b4c5d",
            "s": "0x2e1f4a0d9b8c7f6e5d4c3b2a190807060504030201f0e0d0c0b0a09080706050"
        }
    }"#;

    #[test]
    fn test_parse_relay_order_json() {
        let order: Order = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        let terms = order.terms();
        assert_eq!(
            terms.maker_token.to_hex(),
            "0xe41d2489571d322189246dafa5ebde1f4699f498"
        );
        assert_eq!(terms.maker_amount.to_string(), "18981000000000000");
        assert_eq!(order.signature().v(), 27);
        assert_eq!(order.signature().r()[0], 0x5c);
        assert!(order.taker_amount_filled().is_zero());
        assert!(order.taker_amount_cancelled().is_zero());
        assert_eq!(order.hash(), &terms.hash());
    }

    #[test]
    fn test_v_as_string_is_accepted() {
        let json = SAMPLE_ORDER_JSON.replace("\"v\": 27", "\"v\": \"28\"");
        let order: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.signature().v(), 28);
    }

    #[test]
    fn test_v_out_of_range_fails() {
        let mut api: ApiOrder = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        api.signature.v = WireV::Number(300);
        assert!(matches!(
            api.to_order(),
            Err(DecodeError::InvalidInteger { field: "ecSignature.v", .. })
        ));
    }

    #[test]
    fn test_malformed_amount_names_field() {
        let mut api: ApiOrder = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        api.taker_fee = "1e18".to_string();
        assert_eq!(
            api.to_order().unwrap_err(),
            DecodeError::InvalidInteger {
                field: "takerFee",
                value: "1e18".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_address_names_field() {
        let mut api: ApiOrder = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        api.fee_recipient = "0xnothex".to_string();
        assert!(matches!(
            api.to_order(),
            Err(DecodeError::InvalidHex { field: "feeRecipient", .. })
        ));
    }

    #[test]
    fn test_short_signature_r_fails() {
        let mut api: ApiOrder = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        api.signature.r = "0x5c6b".to_string();
        assert_eq!(
            api.to_order().unwrap_err(),
            DecodeError::InvalidLength {
                field: "ecSignature.r",
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn test_filled_and_cancelled_amounts_parsed_when_present() {
        let mut api: ApiOrder = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        api.taker_token_amount_filled = "100".to_string();
        api.taker_token_amount_cancelled = "5".to_string();
        let order = api.to_order().unwrap();
        assert_eq!(order.taker_amount_filled(), Uint256::from_u64(100));
        assert_eq!(order.taker_amount_cancelled(), Uint256::from_u64(5));
    }

    #[test]
    fn test_serialize_back_to_wire_shape() {
        let order: Order = serde_json::from_str(SAMPLE_ORDER_JSON).unwrap();
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["makerTokenAddress"], "0xe41d2489571d322189246dafa5ebde1f4699f498");
        assert_eq!(value["expirationUnixTimestampSec"], "1518201120");
        assert_eq!(value["ecSignature"]["v"], 27);
        assert_eq!(value["takerTokenAmountFilled"], "0");

        let again: Order = serde_json::from_value(value).unwrap();
        assert_eq!(again, order);
    }
}
