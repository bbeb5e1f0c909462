//! Relay endpoints and stream defaults
//!
//! Values can be overridden via environment variables. Settings written in
//! the YAML config take precedence over both.

use std::time::Duration;

/// Public relay REST endpoint
pub const DEFAULT_RELAY_URL: &str = "https://api.radarrelay.com/0x/v0";

/// Public relay WebSocket endpoint
pub const DEFAULT_RELAY_WS_URL: &str = "wss://ws.radarrelay.com/0x/v0/ws";

// =============================================================================
// Endpoints
// =============================================================================

/// REST base URL
///
/// Environment variable: `RELAY_URL`
pub fn relay_url() -> String {
    std::env::var("RELAY_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string())
}

/// WebSocket URL
///
/// Environment variable: `RELAY_WS_URL`
pub fn relay_ws_url() -> String {
    std::env::var("RELAY_WS_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_RELAY_WS_URL.to_string())
}

/// Log raw REST request URLs and response bodies (default: off)
///
/// Environment variable: `RELAY_DEBUG`; any value other than empty or `0` enables it
pub fn relay_debug() -> bool {
    std::env::var("RELAY_DEBUG")
        .map(|v| !v.is_empty() && v != "0")
        .unwrap_or(false)
}

// =============================================================================
// Stream
// =============================================================================

/// WebSocket handshake timeout (default: 5000ms)
///
/// Environment variable: `RELAY_HANDSHAKE_TIMEOUT_MS`
pub fn handshake_timeout() -> Duration {
    let ms = std::env::var("RELAY_HANDSHAKE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);
    Duration::from_millis(ms)
}

/// Orders per side requested in the subscribe snapshot (default: 20)
///
/// Environment variable: `RELAY_SNAPSHOT_LIMIT`
pub fn snapshot_limit() -> u32 {
    std::env::var("RELAY_SNAPSHOT_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20)
}

/// Print the effective defaults (startup logs)
pub fn log_configuration() {
    tracing::info!(
        relay_url = %relay_url(),
        relay_ws_url = %relay_ws_url(),
        relay_debug = relay_debug(),
        handshake_timeout_ms = handshake_timeout().as_millis() as u64,
        snapshot_limit = snapshot_limit(),
        "Relay defaults"
    );
}
