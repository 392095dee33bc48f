//! Retry logic with exponential backoff for transient errors.
//!
//! Resource controllers never retry on their own. Retries are a property of
//! the backend, added by wrapping it in a [`RetryingBackend`].
//!
//! Reads and deletes retry every retryable error. Upserts retry only
//! [`Error::RateLimited`]: a create is a non-idempotent `POST`, and an update
//! whose response was lost would come back as a version conflict.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{ApiKey, Space};
use std::thread;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 means no retry).
    pub max_attempts: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_factor: f64,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a config with the default backoff and the given attempt count.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Execute an operation, retrying retryable errors with exponential backoff.
///
/// Rate-limit errors that carry a reset time wait at least that long.
pub fn with_retry<T, F>(config: &RetryConfig, label: &str, operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    with_retry_if(config, label, Error::is_retryable, operation)
}

/// Like [`with_retry`], but only errors accepted by `should_retry` are retried.
pub fn with_retry_if<T, F, R>(
    config: &RetryConfig,
    label: &str,
    should_retry: R,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
    R: Fn(&Error) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) || attempt + 1 >= config.max_attempts {
                    return Err(e);
                }

                let mut delay = config.delay_for_attempt(attempt);
                if let Error::RateLimited {
                    reset_secs: Some(secs),
                } = &e
                {
                    delay = delay.max(Duration::from_secs(*secs));
                }

                log::warn!(
                    "{label}: attempt {}/{} failed: {e}. Retrying in {:.1}s",
                    attempt + 1,
                    config.max_attempts,
                    delay.as_secs_f64()
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// A backend that retries transient failures of an inner backend.
pub struct RetryingBackend<B> {
    inner: B,
    config: RetryConfig,
}

impl<B: Backend> RetryingBackend<B> {
    /// Wrap `inner` with the given retry policy.
    pub fn new(inner: B, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

/// Rejected before the server did any work
fn rejected_unprocessed(e: &Error) -> bool {
    matches!(e, Error::RateLimited { .. })
}

impl<B: Backend> Backend for RetryingBackend<B> {
    fn upsert_space(&self, space: &Space) -> Result<Space> {
        with_retry_if(&self.config, "upsert space", rejected_unprocessed, || {
            self.inner.upsert_space(space)
        })
    }

    fn get_space(&self, id: &str) -> Result<Space> {
        with_retry(&self.config, "get space", || self.inner.get_space(id))
    }

    fn delete_space(&self, space: &Space) -> Result<()> {
        with_retry(&self.config, "delete space", || {
            self.inner.delete_space(space)
        })
    }

    fn upsert_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<ApiKey> {
        with_retry_if(&self.config, "upsert api key", rejected_unprocessed, || {
            self.inner.upsert_api_key(space_id, api_key)
        })
    }

    fn get_api_key(&self, space_id: &str, id: &str) -> Result<ApiKey> {
        with_retry(&self.config, "get api key", || {
            self.inner.get_api_key(space_id, id)
        })
    }

    fn delete_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<()> {
        with_retry(&self.config, "delete api key", || {
            self.inner.delete_api_key(space_id, api_key)
        })
    }
}
