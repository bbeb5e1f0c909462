//! Configuration types
//!
//! This module defines the structs loaded from `config.yaml`. Fields left
//! out of the file fall back to the environment-overridable defaults in
//! [`super::constants`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::AppError;
use crate::order::Address;
use crate::relay::client::DEFAULT_REQUEST_ATTEMPTS;
use crate::shared::BackoffPolicy;
use crate::stream::session::{SessionConfig, DEFAULT_MAX_PROTOCOL_ERRORS};
use crate::stream::DEFAULT_RECOVERABLE_CLOSE_CODES;
use crate::tokens::{TokenEntry, TokenRegistry};

// ============================================================================
// Configuration Structs
// ============================================================================

/// REST relay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// REST base URL
    pub url: String,
    /// WebSocket URL for orderbook streams
    pub ws_url: String,
    /// Log raw request URLs and response bodies
    pub debug: bool,
    /// Attempts per REST request, including the first
    pub max_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: constants::relay_url(),
            ws_url: constants::relay_ws_url(),
            debug: constants::relay_debug(),
            max_attempts: DEFAULT_REQUEST_ATTEMPTS,
        }
    }
}

/// Orderbook stream settings shared by every pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub snapshot_limit: u32,
    pub handshake_timeout_ms: u64,
    pub recoverable_close_codes: Vec<u16>,
    pub max_consecutive_protocol_errors: u32,
    pub backoff: BackoffPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            snapshot_limit: constants::snapshot_limit(),
            handshake_timeout_ms: constants::handshake_timeout().as_millis() as u64,
            recoverable_close_codes: DEFAULT_RECOVERABLE_CLOSE_CODES.to_vec(),
            max_consecutive_protocol_errors: DEFAULT_MAX_PROTOCOL_ERRORS,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl StreamConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            snapshot_limit: self.snapshot_limit,
            recoverable_close_codes: self.recoverable_close_codes.clone(),
            backoff: self.backoff.clone(),
            max_consecutive_protocol_errors: self.max_consecutive_protocol_errors,
        }
    }

    /// Validate stream settings
    pub fn validate(&self) -> Result<(), AppError> {
        if self.snapshot_limit == 0 {
            return Err(AppError::Config(
                "stream.snapshot_limit must be > 0".to_string(),
            ));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(AppError::Config(
                "stream.handshake_timeout_ms must be > 0".to_string(),
            ));
        }
        if let Some(code) = self
            .recoverable_close_codes
            .iter()
            .find(|c| !(1000..=4999).contains(*c))
        {
            return Err(AppError::Config(format!(
                "stream.recoverable_close_codes: {} is not a WebSocket close code",
                code
            )));
        }
        if self.backoff.initial_delay_ms > self.backoff.max_delay_ms {
            return Err(AppError::Config(format!(
                "stream.backoff.initial_delay_ms ({}) must be <= max_delay_ms ({})",
                self.backoff.initial_delay_ms, self.backoff.max_delay_ms
            )));
        }
        if self.backoff.max_attempts == Some(0) {
            return Err(AppError::Config(
                "stream.backoff.max_attempts must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pair to stream, as symbols from `tokens` or hex addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    pub base: String,
    pub quote: String,
}

/// Pair with both sides resolved to addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair {
    pub label: String,
    pub base: Address,
    pub quote: Address,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
    pub pairs: Vec<PairConfig>,
}

impl AppConfig {
    /// Validate the full configuration
    pub fn validate(&self) -> Result<(), AppError> {
        if self.relay.url.trim().is_empty() {
            return Err(AppError::Config("relay.url cannot be empty".to_string()));
        }
        if self.relay.ws_url.trim().is_empty() {
            return Err(AppError::Config("relay.ws_url cannot be empty".to_string()));
        }
        if self.relay.max_attempts == 0 {
            return Err(AppError::Config(
                "relay.max_attempts must be > 0".to_string(),
            ));
        }
        self.stream.validate()?;

        if self.pairs.is_empty() {
            return Err(AppError::Config(
                "At least one pair must be configured".to_string(),
            ));
        }
        self.resolve_pairs(&self.token_registry()?)?;
        Ok(())
    }

    pub fn token_registry(&self) -> Result<TokenRegistry, AppError> {
        TokenRegistry::new(&self.tokens)
    }

    /// Resolve every configured pair through `registry`
    pub fn resolve_pairs(&self, registry: &TokenRegistry) -> Result<Vec<ResolvedPair>, AppError> {
        self.pairs
            .iter()
            .map(|pair| {
                let resolve = |value: &str| {
                    registry.resolve(value).ok_or_else(|| {
                        AppError::Config(format!(
                            "Unknown token '{}' in pair {}/{}",
                            value, pair.base, pair.quote
                        ))
                    })
                };
                let base = resolve(&pair.base)?;
                let quote = resolve(&pair.quote)?;
                if base == quote {
                    return Err(AppError::Config(format!(
                        "Pair {}/{} has the same base and quote token",
                        pair.base, pair.quote
                    )));
                }
                Ok(ResolvedPair {
                    label: registry.pair_label(&base, &quote),
                    base,
                    quote,
                })
            })
            .collect()
    }

    /// Retry policy for REST calls
    pub fn request_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: Some(self.relay.max_attempts),
            ..crate::relay::client::default_request_policy()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
