//! Orderbook stream session
//!
//! One session follows one (base, quote) pair through the connection state
//! machine:
//!
//! ```text
//! Disconnected -> Connecting -> Subscribing -> Streaming
//!                     ^                            |
//!                     +------- Reconnecting <------+   (recoverable close)
//!
//! any state -> Failed  (fatal error, attempts exhausted)
//! any state -> Stopped (cancellation)
//! ```
//!
//! Everything runs inline on the task that calls [`StreamSession::run`]; the
//! only suspension points are connect, send, read and backoff sleeps, each
//! raced against the cancellation token.

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::errors::{StreamError, StreamResult, DEFAULT_RECOVERABLE_CLOSE_CODES};
use super::messages::{decode_frame, frame_type, next_request_id, InboundFrame, SubscribeRequest};
use super::mirror::OrderbookMirror;
use super::transport::{Connector, FrameTransport};
use crate::order::{Address, Order, Side};
use crate::shared::BackoffPolicy;

/// Default number of orders per side requested in the snapshot
pub const DEFAULT_SNAPSHOT_LIMIT: u32 = 20;

/// Default number of consecutive undecodable book frames tolerated
pub const DEFAULT_MAX_PROTOCOL_ERRORS: u32 = 16;

/// Protocol state of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamState {
    #[default]
    Disconnected,
    Connecting,
    Subscribing,
    Streaming,
    Reconnecting,
    Failed,
    Stopped,
}

impl StreamState {
    /// Failed and Stopped never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Failed | StreamState::Stopped)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamState::Disconnected => "disconnected",
            StreamState::Connecting => "connecting",
            StreamState::Subscribing => "subscribing",
            StreamState::Streaming => "streaming",
            StreamState::Reconnecting => "reconnecting",
            StreamState::Failed => "failed",
            StreamState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Notifications published by a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    StateChanged {
        pair: String,
        state: StreamState,
    },
    SnapshotReplaced {
        pair: String,
        bids: usize,
        asks: usize,
    },
    OrderUpdated {
        pair: String,
        side: Side,
        order: Order,
    },
    Announcement {
        pair: String,
        motd: Option<String>,
        announcements: Vec<String>,
    },
}

/// Tunables for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Orders per side requested in the initial snapshot
    pub snapshot_limit: u32,
    /// Close codes after which the session reconnects
    pub recoverable_close_codes: Vec<u16>,
    /// Delay and attempt cap between reconnects
    pub backoff: BackoffPolicy,
    /// Consecutive undecodable snapshot/update frames before failing
    pub max_consecutive_protocol_errors: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            recoverable_close_codes: DEFAULT_RECOVERABLE_CLOSE_CODES.to_vec(),
            backoff: BackoffPolicy::default(),
            max_consecutive_protocol_errors: DEFAULT_MAX_PROTOCOL_ERRORS,
        }
    }
}

/// Outcome of a step that may be interrupted by cancellation
enum Step {
    Continue,
    Cancelled,
}

/// Streaming orderbook client for one pair
pub struct StreamSession<C: Connector> {
    pair: String,
    base: Address,
    quote: Address,
    config: SessionConfig,
    connector: C,
    state: StreamState,
    request_id: Option<u32>,
    transport: Option<Box<dyn FrameTransport>>,
    mirror: OrderbookMirror,
    events: Option<mpsc::Sender<StreamEvent>>,
    reconnect_attempts: u32,
    protocol_errors: u32,
}

impl<C: Connector> StreamSession<C> {
    pub fn new(
        pair: impl Into<String>,
        base: Address,
        quote: Address,
        connector: C,
        config: SessionConfig,
    ) -> Self {
        Self {
            pair: pair.into(),
            base,
            quote,
            config,
            connector,
            state: StreamState::Disconnected,
            request_id: None,
            transport: None,
            mirror: OrderbookMirror::new(),
            events: None,
            reconnect_attempts: 0,
            protocol_errors: 0,
        }
    }

    /// Publish [`StreamEvent`]s on `tx` while running
    pub fn with_events(mut self, tx: mpsc::Sender<StreamEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn base(&self) -> &Address {
        &self.base
    }

    pub fn quote(&self) -> &Address {
        &self.quote
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Request id of the current subscription
    pub fn request_id(&self) -> Option<u32> {
        self.request_id
    }

    pub fn mirror(&self) -> &OrderbookMirror {
        &self.mirror
    }

    pub fn into_mirror(self) -> OrderbookMirror {
        self.mirror
    }

    /// Connect, subscribe and stream until cancelled or failed.
    ///
    /// Returns `Ok(())` when stopped through `cancel`, or the terminal error
    /// that put the session into [`StreamState::Failed`].
    pub async fn run(&mut self, cancel: CancellationToken) -> StreamResult<()> {
        if self.state.is_terminal() {
            return Err(StreamError::Fatal(format!(
                "session for {} already {}",
                self.pair, self.state
            )));
        }

        tracing::info!(
            pair = %self.pair,
            base = %self.base,
            quote = %self.quote,
            "Starting orderbook stream"
        );

        match self.open(&cancel).await {
            Ok(Step::Continue) => {}
            Ok(Step::Cancelled) => {
                self.stop().await;
                return Ok(());
            }
            Err(e) => return Err(self.fail(e).await),
        }

        loop {
            let read = match self.transport.as_mut() {
                Some(transport) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    res = transport.next_text() => Some(res),
                },
                None => Some(Err(StreamError::Fatal("transport missing".into()))),
            };

            match read {
                None => {
                    self.stop().await;
                    return Ok(());
                }
                Some(Ok(text)) => {
                    if let Err(e) = self.handle_text(&text) {
                        return Err(self.fail(e).await);
                    }
                }
                Some(Err(e @ StreamError::Protocol(_))) => {
                    if let Err(e) = self.count_protocol_error(e) {
                        return Err(self.fail(e).await);
                    }
                }
                Some(Err(e)) if e.is_recoverable(&self.config.recoverable_close_codes) => {
                    tracing::warn!(
                        pair = %self.pair,
                        code = ?e.close_code(),
                        "Stream closed, reconnecting"
                    );
                    match self.reconnect(&cancel, e).await {
                        Ok(Step::Continue) => {}
                        Ok(Step::Cancelled) => {
                            self.stop().await;
                            return Ok(());
                        }
                        Err(e) => return Err(self.fail(e).await),
                    }
                }
                Some(Err(e)) => return Err(self.fail(e).await),
            }
        }
    }

    /// Connect and send the subscribe request
    async fn open(&mut self, cancel: &CancellationToken) -> StreamResult<Step> {
        self.set_state(StreamState::Connecting);

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Step::Cancelled),
            res = self.connector.connect() => res,
        };
        let mut transport = connected?;

        self.set_state(StreamState::Subscribing);
        let request_id = next_request_id();
        let request = SubscribeRequest::orderbook(
            request_id,
            self.base,
            self.quote,
            self.config.snapshot_limit,
        )
        .to_json()?;

        tracing::info!(pair = %self.pair, request_id, "Subscribing to orderbook");
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = transport.send_text(request) => Some(res),
        };
        match sent {
            None => {
                transport.close().await;
                Ok(Step::Cancelled)
            }
            Some(Err(e)) => {
                transport.close().await;
                Err(e)
            }
            Some(Ok(())) => {
                self.request_id = Some(request_id);
                self.transport = Some(transport);
                Ok(Step::Continue)
            }
        }
    }

    /// Replace the lost transport, retrying per the backoff policy
    async fn reconnect(
        &mut self,
        cancel: &CancellationToken,
        cause: StreamError,
    ) -> StreamResult<Step> {
        self.set_state(StreamState::Reconnecting);
        if let Some(mut old) = self.transport.take() {
            old.close().await;
        }

        let mut last_error = cause;
        loop {
            if !self.config.backoff.allows(self.reconnect_attempts) {
                return Err(StreamError::ReconnectExhausted {
                    attempts: self.reconnect_attempts,
                    last_error: last_error.to_string(),
                });
            }

            let delay = self.config.backoff.delay(self.reconnect_attempts);
            self.reconnect_attempts += 1;
            tracing::info!(
                pair = %self.pair,
                attempt = self.reconnect_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Step::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            match self.open(cancel).await {
                Ok(step) => return Ok(step),
                Err(e)
                    if e.is_connect_failure()
                        || e.is_recoverable(&self.config.recoverable_close_codes) =>
                {
                    tracing::warn!(pair = %self.pair, error = %e, "Reconnect attempt failed");
                    self.set_state(StreamState::Reconnecting);
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode one frame and apply it; only a broken protocol contract is an error
    fn handle_text(&mut self, text: &str) -> StreamResult<()> {
        let frame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => return self.record_bad_frame(text, e),
        };

        self.protocol_errors = 0;
        if self.state == StreamState::Subscribing {
            self.set_state(StreamState::Streaming);
            self.reconnect_attempts = 0;
        }

        match frame {
            InboundFrame::SubscribeAck { request_id } => {
                if request_id.is_some() && request_id != self.request_id {
                    tracing::warn!(
                        pair = %self.pair,
                        expected = ?self.request_id,
                        received = ?request_id,
                        "Subscribe ack request id mismatch"
                    );
                } else {
                    tracing::debug!(
                        pair = %self.pair,
                        request_id = ?request_id,
                        "Subscription acknowledged"
                    );
                }
            }
            InboundFrame::Snapshot { bids, asks } => {
                tracing::info!(
                    pair = %self.pair,
                    bids = bids.len(),
                    asks = asks.len(),
                    "Orderbook snapshot"
                );
                self.mirror.replace(bids, asks);
                self.emit(StreamEvent::SnapshotReplaced {
                    pair: self.pair.clone(),
                    bids: self.mirror.bids().len(),
                    asks: self.mirror.asks().len(),
                });
            }
            InboundFrame::Update(order) => {
                let side = self.mirror.apply_update(order.clone(), &self.base);
                tracing::debug!(
                    pair = %self.pair,
                    side = %side,
                    hash = %order.hash_hex(),
                    "Order update"
                );
                self.emit(StreamEvent::OrderUpdated {
                    pair: self.pair.clone(),
                    side,
                    order,
                });
            }
            InboundFrame::Announcement { motd, announcements } => {
                if let Some(motd) = &motd {
                    tracing::info!(pair = %self.pair, motd = %motd, "MOTD");
                }
                for a in &announcements {
                    tracing::info!(pair = %self.pair, announcement = %a, "Announcement");
                }
                self.emit(StreamEvent::Announcement {
                    pair: self.pair.clone(),
                    motd,
                    announcements,
                });
            }
        }
        Ok(())
    }

    fn record_bad_frame(&mut self, text: &str, err: StreamError) -> StreamResult<()> {
        let kind = frame_type(text).ok().flatten();
        let is_book_frame = matches!(kind, Some("snapshot") | Some("update"));
        if !is_book_frame {
            tracing::warn!(pair = %self.pair, error = %err, "Skipping unreadable frame");
            return Ok(());
        }

        self.count_protocol_error(err)
    }

    /// Skip one bad frame; too many in a row means the relay broke the protocol
    fn count_protocol_error(&mut self, err: StreamError) -> StreamResult<()> {
        self.protocol_errors += 1;
        tracing::warn!(
            pair = %self.pair,
            error = %err,
            consecutive = self.protocol_errors,
            "Skipping undecodable frame"
        );
        if self.protocol_errors > self.config.max_consecutive_protocol_errors {
            return Err(StreamError::Fatal(format!(
                "{} consecutive undecodable frames, last: {}",
                self.protocol_errors, err
            )));
        }
        Ok(())
    }

    fn set_state(&mut self, state: StreamState) {
        if self.state == state {
            return;
        }
        tracing::debug!(pair = %self.pair, from = %self.state, to = %state, "Stream state change");
        self.state = state;
        self.emit(StreamEvent::StateChanged {
            pair: self.pair.clone(),
            state,
        });
    }

    fn emit(&mut self, event: StreamEvent) {
        let Some(tx) = &self.events else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(pair = %self.pair, "Event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(pair = %self.pair, "Event receiver dropped");
                self.events = None;
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        tracing::info!(pair = %self.pair, "Orderbook stream stopped");
        self.set_state(StreamState::Stopped);
    }

    async fn fail(&mut self, err: StreamError) -> StreamError {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        tracing::error!(pair = %self.pair, error = %err, "Orderbook stream failed");
        self.set_state(StreamState::Failed);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(StreamState::Failed.is_terminal());
        assert!(StreamState::Stopped.is_terminal());
        assert!(!StreamState::Reconnecting.is_terminal());
        assert!(!StreamState::Disconnected.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(StreamState::Streaming.to_string(), "streaming");
        assert_eq!(StreamState::Reconnecting.to_string(), "reconnecting");
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.snapshot_limit, 20);
        assert_eq!(config.recoverable_close_codes.len(), 14);
        assert_eq!(config.max_consecutive_protocol_errors, 16);
        assert_eq!(config.backoff, BackoffPolicy::default());
    }
}
