//! Orderbook stream wire messages
//!
//! Outbound: the subscribe request. Inbound: frames discriminated by their
//! `type` field. The header is read first with a borrowed view so that only
//! the selected variant pays for a full decode.

use serde::{Deserialize, Serialize};

use super::errors::{StreamError, StreamResult};
use crate::order::{Address, ApiOrder, Order};
use crate::relay::ApiOrderbook;

/// Channel name used for orderbook subscriptions
pub const ORDERBOOK_CHANNEL: &str = "orderbook";

/// Exclusive upper bound of generated subscribe request ids
pub const REQUEST_ID_RANGE: u32 = 5096;

// =============================================================================
// Outbound
// =============================================================================

/// Subscription target carried in the subscribe request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePayload {
    pub base_token_address: Address,
    pub quote_token_address: Address,
    pub snapshot: bool,
    pub limit: u32,
}

/// `{"type":"subscribe","channel":"orderbook","requestId":..,"payload":{..}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    pub request_id: u32,
    pub payload: SubscribePayload,
}

impl SubscribeRequest {
    /// Orderbook subscription with a snapshot of up to `limit` orders per side
    pub fn orderbook(request_id: u32, base: Address, quote: Address, limit: u32) -> Self {
        Self {
            kind: "subscribe".to_string(),
            channel: ORDERBOOK_CHANNEL.to_string(),
            request_id,
            payload: SubscribePayload {
                base_token_address: base,
                quote_token_address: quote,
                snapshot: true,
                limit,
            },
        }
    }

    pub fn to_json(&self) -> StreamResult<String> {
        serde_json::to_string(self).map_err(|e| {
            StreamError::Protocol(format!("Failed to encode subscribe request: {}", e))
        })
    }
}

/// Random request id in `0..REQUEST_ID_RANGE`
pub fn next_request_id() -> u32 {
    rand::random::<u32>() % REQUEST_ID_RANGE
}

// =============================================================================
// Inbound
// =============================================================================

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Server echo of our subscribe request
    SubscribeAck { request_id: Option<u32> },
    /// Full book replacement, in received order
    Snapshot { bids: Vec<Order>, asks: Vec<Order> },
    /// One new or changed order
    Update(Order),
    /// Message of the day and service announcements
    Announcement {
        motd: Option<String>,
        announcements: Vec<String>,
    },
}

impl InboundFrame {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            InboundFrame::SubscribeAck { .. } => "subscribe",
            InboundFrame::Snapshot { .. } => "snapshot",
            InboundFrame::Update(_) => "update",
            InboundFrame::Announcement { .. } => "announcement",
        }
    }
}

#[derive(Deserialize)]
struct FrameHeader<'a> {
    #[serde(rename = "type", borrow, default)]
    kind: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AckFrame {
    #[serde(default)]
    request_id: Option<u32>,
}

#[derive(Deserialize)]
struct SnapshotFrame {
    payload: ApiOrderbook,
}

#[derive(Deserialize)]
struct UpdateFrame {
    payload: ApiOrder,
}

#[derive(Deserialize)]
struct AnnouncementFrame {
    #[serde(default)]
    motd: Option<String>,
    #[serde(default)]
    announcements: Vec<String>,
}

/// Read only the `type` discriminator of a frame
pub fn frame_type(text: &str) -> StreamResult<Option<&str>> {
    let header: FrameHeader<'_> = serde_json::from_str(text)
        .map_err(|e| StreamError::Protocol(format!("Frame is not a JSON object: {}", e)))?;
    Ok(header.kind)
}

/// Decode one text frame into an [`InboundFrame`]
pub fn decode_frame(text: &str) -> StreamResult<InboundFrame> {
    let kind = frame_type(text)?;
    match kind {
        Some("subscribe") => {
            let ack: AckFrame = parse(text, "subscribe")?;
            Ok(InboundFrame::SubscribeAck {
                request_id: ack.request_id,
            })
        }
        Some("snapshot") => {
            let frame: SnapshotFrame = parse(text, "snapshot")?;
            let book = frame.payload.to_orderbook()?;
            Ok(InboundFrame::Snapshot {
                bids: book.bids,
                asks: book.asks,
            })
        }
        Some("update") => {
            let frame: UpdateFrame = parse(text, "update")?;
            Ok(InboundFrame::Update(frame.payload.to_order()?))
        }
        _ => {
            let frame: AnnouncementFrame = parse(text, "announcement")?;
            Ok(InboundFrame::Announcement {
                motd: frame.motd,
                announcements: frame.announcements,
            })
        }
    }
}

fn parse<'a, T: Deserialize<'a>>(text: &'a str, kind: &str) -> StreamResult<T> {
    serde_json::from_str(text)
        .map_err(|e| StreamError::Protocol(format!("Malformed {} frame: {}", kind, e)))
}
