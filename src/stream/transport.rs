//! Stream transport
//!
//! The session talks to the relay through two small traits so the state
//! machine can be driven by an in-memory transport in tests. The production
//! implementation is a TLS WebSocket via `tokio-tungstenite`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector as TlsConnector, MaybeTlsStream, WebSocketStream,
};

use super::errors::{StreamError, StreamResult, ABNORMAL_CLOSURE};

/// Close code used when a close frame carries no status
const NO_STATUS_RECEIVED: u16 = 1005;

/// Type alias for the WebSocket stream with TLS
pub type TlsWebSocketStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// An open, message-oriented connection to the relay
#[async_trait]
pub trait FrameTransport: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> StreamResult<()>;

    /// Wait for the next text payload.
    ///
    /// Control frames and binary frames that are not UTF-8 are consumed
    /// internally. A `Protocol` error is treated by the session as one bad
    /// frame, not as a dead connection. A close from the peer surfaces
    /// as [`StreamError::Closed`] with its code; a connection that drops
    /// without a close frame reports code 1006.
    async fn next_text(&mut self) -> StreamResult<String>;

    /// Close the connection; errors are logged, not returned
    async fn close(&mut self);
}

/// Opens new transports; called once per (re)connect
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> StreamResult<Box<dyn FrameTransport>>;
}

/// Connect to a WebSocket endpoint with TLS (TLSv1.2 minimum)
pub async fn connect_tls(url: &str) -> StreamResult<TlsWebSocketStream> {
    let tls = native_tls::TlsConnector::builder()
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
        .build()
        .map_err(|e| StreamError::ConnectionFailed(format!("TLS error: {}", e)))?;

    let (ws_stream, _response) =
        connect_async_tls_with_config(url, None, false, Some(TlsConnector::NativeTls(tls)))
            .await
            .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;

    Ok(ws_stream)
}

/// WebSocket connector with a bounded handshake
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    handshake_timeout: Duration,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, handshake_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            handshake_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> StreamResult<Box<dyn FrameTransport>> {
        tracing::debug!(url = %self.url, "Opening WebSocket");
        let timeout_ms = self.handshake_timeout.as_millis() as u64;
        let stream = timeout(self.handshake_timeout, connect_tls(&self.url))
            .await
            .map_err(|_| StreamError::HandshakeTimeout(timeout_ms))??;
        Ok(Box::new(WsTransport { stream }))
    }
}

/// [`FrameTransport`] over a tungstenite stream
pub struct WsTransport {
    stream: TlsWebSocketStream,
}

#[async_trait]
impl FrameTransport for WsTransport {
    async fn send_text(&mut self, text: String) -> StreamResult<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(classify_ws_error)
    }

    async fn next_text(&mut self) -> StreamResult<String> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Err(classify_ws_error(e)),
                None => return Err(StreamError::Closed { code: ABNORMAL_CLOSURE }),
            };

            match msg {
                Message::Text(text) => return Ok(text),
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping binary frame that is not UTF-8");
                    }
                },
                Message::Close(frame) => {
                    let code = frame
                        .map(|f| u16::from(f.code))
                        .unwrap_or(NO_STATUS_RECEIVED);
                    tracing::info!(code, "WebSocket closed by server");
                    return Err(StreamError::Closed { code });
                }
                Message::Ping(_) | Message::Pong(_) => {
                    tracing::trace!("Control frame received");
                }
                Message::Frame(_) => {
                    tracing::trace!("Raw frame received");
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}

/// Map a tungstenite error to a close code where the connection simply died
fn classify_ws_error(err: WsError) -> StreamError {
    let dropped = match &err {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        WsError::Io(io) => matches!(
            io.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
        ),
        _ => false,
    };
    if dropped {
        StreamError::Closed { code: ABNORMAL_CLOSURE }
    } else {
        StreamError::from(err)
    }
}
