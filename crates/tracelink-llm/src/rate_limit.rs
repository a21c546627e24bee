//! Rate-limited calls with exponential backoff
//!
//! Every oracle call goes through a [`RateLimiter`]: calls are spaced to a
//! calls-per-minute ceiling, transient failures (rate limit, timeout,
//! connection) are retried after `base_delay × 2^attempt`, and any other
//! error is returned immediately.

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Throttling and retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Call ceiling per minute (0 disables throttling)
    pub calls_per_minute: u32,

    /// Total attempts per call, including the first
    pub max_retries: u32,

    /// Backoff base delay (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound on a single attempt (seconds)
    pub call_timeout_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls_per_minute: 30,
            max_retries: 5,
            base_delay_ms: 2000,
            call_timeout_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Configuration without waiting, for tests and offline runs
    pub fn unthrottled() -> Self {
        Self {
            calls_per_minute: 0,
            max_retries: 5,
            base_delay_ms: 0,
            call_timeout_secs: 60,
        }
    }

    /// Minimum spacing between two calls
    pub fn min_interval(&self) -> Duration {
        if self.calls_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / self.calls_per_minute
        }
    }

    /// Backoff before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        Duration::from_millis(self.base_delay_ms).saturating_mul(factor)
    }

    /// Timeout for one attempt
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Serialises oracle calls to a rate ceiling and retries transient failures
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    last_call: Option<Instant>,
    attempts: usize,
    retries: usize,
}

impl RateLimiter {
    /// Create a limiter
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            last_call: None,
            attempts: 0,
            retries: 0,
        }
    }

    /// Attempts made so far, retries included
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Retries made so far
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Wait until the next call is allowed
    async fn throttle(&mut self) {
        let interval = self.config.min_interval();
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        self.last_call = Some(Instant::now());
    }

    /// Run `op` under the rate ceiling, retrying transient failures
    ///
    /// Each attempt is bounded by the configured call timeout; an elapsed
    /// timeout counts as a transient [`LlmError::Timeout`].
    pub async fn call_with_retry<T, F, Fut>(&mut self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.throttle().await;
            self.attempts += 1;

            let outcome = match tokio::time::timeout(self.config.call_timeout(), op()).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.config.max_retries => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        "Transient oracle error (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        self.config.max_retries,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    self.retries += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
