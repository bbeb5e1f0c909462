//! Shared retry logic with exponential backoff
//!
//! Used by the stream session between reconnect attempts and by the REST
//! client between request retries. Delays double per attempt, are capped at
//! `max_delay_ms` and carry random jitter so parallel sessions do not
//! reconnect in lockstep.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for retry attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Maximum number of attempts; `None` retries forever
    pub max_attempts: Option<u32>,
    /// Initial delay in milliseconds (doubles each attempt)
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Upper bound (exclusive) of random jitter added to each delay
    pub jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(10),
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            jitter_ms: 200,
        }
    }
}

impl BackoffPolicy {
    /// Policy that retries immediately and without limit
    pub fn unbounded_immediate() -> Self {
        Self {
            max_attempts: None,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Whether another attempt is allowed after `attempts_made` attempts
    pub fn allows(&self, attempts_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts_made < max)
    }

    /// Delay before attempt number `attempt` (0-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(63)).unwrap_or(u64::MAX);
        let ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Delay before attempt number `attempt` (0-based), with jitter
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::random::<u64>() % self.jitter_ms
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

/// Run `op` until it succeeds, `should_retry` rejects the error, or the
/// policy runs out of attempts. The last error is returned on failure.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &BackoffPolicy,
    label: &str,
    mut op: F,
    should_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if !should_retry(&e) || !policy.allows(attempt) {
                    return Err(e);
                }
                let wait = policy.delay(attempt - 1);
                tracing::warn!(
                    "{}: attempt {} failed: {}, retrying in {}ms",
                    label,
                    attempt,
                    e,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}
