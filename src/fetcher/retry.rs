//! Retry configuration, delay calculation, and the retrying fetcher decorator.
//!
//! [`RetryingFetcher`] wraps any [`TagFetcher`] and retries transient
//! failures (rate limits, network errors, 5xx) with exponential backoff.
//! Permanent failures (not found, access denied) are returned at once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::TagFetcher;
use crate::error::FetchError;
use crate::telemetry;
use crate::types::{Ocid, TagSet};

/// Configuration for retry behaviour on transient errors.
///
/// ```rust
/// # use huginn::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    #[serde(rename = "initial_delay_ms", with = "millis")]
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    #[serde(rename = "max_delay_ms", with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Delay honouring a server `retry_after` hint when one is given.
    /// Hints are capped at `max_delay`.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(self.max_delay),
            None => self.delay_for_attempt(attempt),
        }
    }
}

/// Decorator that retries transient lookup failures.
pub struct RetryingFetcher {
    inner: Arc<dyn TagFetcher>,
    config: RetryConfig,
}

impl RetryingFetcher {
    /// Wrap a fetcher with retry logic.
    pub fn new(inner: Arc<dyn TagFetcher>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl TagFetcher for RetryingFetcher {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, id: &Ocid) -> Result<TagSet, FetchError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.inner.fetch(id).await {
                Ok(tags) => return Ok(tags),
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    let delay = self.config.effective_delay(attempt, e.retry_after());
                    metrics::counter!(telemetry::RETRIES_TOTAL).increment(1);
                    warn!(
                        fetcher = self.inner.name(),
                        ocid = %id,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
