//! Retry logic for remote writes
//!
//! Transient failures (connectivity, rate limiting, server errors) are
//! retried with exponential backoff: `base_delay * 2^attempt`, at most
//! `max_retries` times. Anything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use mindsync_core::config::SyncConfig;
use mindsync_core::ports::RemoteStoreError;

/// Backoff parameters for [`with_retry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for RetryPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// Determines whether a remote failure is worth retrying
///
/// Uses the classification attached by the adapter; untyped errors are
/// judged by their message.
pub fn is_transient_error(err: &anyhow::Error) -> bool {
    if let Some(remote) = err
        .chain()
        .find_map(|e| e.downcast_ref::<RemoteStoreError>())
    {
        return remote.is_transient();
    }

    let err_str = format!("{err:#}").to_lowercase();

    // Network errors
    if err_str.contains("network")
        || err_str.contains("connection")
        || err_str.contains("timeout")
        || err_str.contains("reset by peer")
    {
        return true;
    }

    // Rate limiting
    if err_str.contains("429") || err_str.contains("too many requests") {
        return true;
    }

    // Server errors (5xx)
    err_str.contains("502") || err_str.contains("503") || err_str.contains("504")
}

/// Executes an async operation, retrying transient failures
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, operation_name: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if attempt < policy.max_retries && is_transient_error(&err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
