//! Retry with exponential backoff for transient store failures.
//!
//! Only errors for which [`Error::is_retryable`] holds are retried, so an
//! authentication or entropy failure from the crypto core is surfaced
//! on the first attempt. Every request handed to [`RetryExecutor`] must be
//! safe to replay: the HTTP store makes `POST` replay-safe by sending a
//! client-chosen item id.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use zkvault_common::{Error, Result};

/// Backoff schedule for store requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub initial_delay: Duration,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Spread each wait over 75%..125% of its nominal value.
    pub jitter: bool,
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Single attempt, failures are returned as-is.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait before retry number `retry` (zero-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(retry.min(i32::MAX as u32) as i32);
        let nominal = (self.initial_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);

        let millis = if self.jitter {
            nominal * rand::thread_rng().gen_range(0.75..=1.25)
        } else {
            nominal
        };

        Duration::from_millis(millis.round() as u64)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs replay-safe store requests, retrying transient failures.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `request`, labelled `operation` in logs, until it succeeds, fails
    /// with a non-retryable error or the retry budget is spent.
    pub async fn execute<F, Fut, T>(&self, operation: &str, request: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;

        loop {
            let err = match request().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(operation, retries, "Store request recovered");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() || retries >= self.config.max_retries {
                if err.is_retryable() {
                    warn!(operation, attempts = retries + 1, error = %err, "Store request failed");
                }
                return Err(err);
            }

            let delay = self.config.delay_for_attempt(retries);
            retries += 1;
            warn!(operation, retry = retries, ?delay, error = %err, "Transient store failure");
            sleep(delay).await;
        }
    }
}
