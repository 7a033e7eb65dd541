use std::future::Future;
use std::time::Duration;

use super::types::VulnmapError;
use crate::http::constants::{
    DEFAULT_RETRY_BACKOFF_SECS, DEFAULT_RETRY_COUNT, MAX_RETRY_BACKOFF_SECS, MAX_RETRY_COUNT,
};
use tracing::{debug, warn};

/// Bounded retry budget for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_count: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            backoff: Duration::from_secs(DEFAULT_RETRY_BACKOFF_SECS),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from optional request settings, applying defaults for
    /// unset values and rejecting out-of-range ones.
    pub fn from_settings(retry_count: Option<u32>, backoff_secs: Option<u64>) -> Result<Self, VulnmapError> {
        let retry_count = retry_count.unwrap_or(DEFAULT_RETRY_COUNT);
        let backoff_secs = backoff_secs.unwrap_or(DEFAULT_RETRY_BACKOFF_SECS);

        if retry_count > MAX_RETRY_COUNT {
            return Err(VulnmapError::Config(format!(
                "Retry count cannot be greater than {}", MAX_RETRY_COUNT
            )));
        }
        if backoff_secs > MAX_RETRY_BACKOFF_SECS {
            return Err(VulnmapError::Config(format!(
                "Retry backoff cannot be greater than {} seconds", MAX_RETRY_BACKOFF_SECS
            )));
        }

        Ok(Self {
            retry_count,
            backoff: Duration::from_secs(backoff_secs),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_count + 1
    }
}

/// Run `factory` until it yields a value `should_retry` accepts or the retry
/// budget is spent.
///
/// An `Err` from the factory is returned immediately and never retried. When
/// the budget runs out the last value is returned as-is, so the caller still
/// sees the final response.
pub async fn with_retry<F, Fut, T, E, P>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut factory: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 1;

    loop {
        let value = factory().await?;

        if !should_retry(&value) {
            return Ok(value);
        }
        if attempt >= max_attempts {
            if policy.retry_count > 0 {
                warn!(
                    operation = operation_name,
                    attempts = attempt,
                    "Retry budget exhausted"
                );
            }
            return Ok(value);
        }

        debug!(
            operation = operation_name,
            attempt,
            remaining = max_attempts - attempt,
            delay_secs = policy.backoff.as_secs(),
            "Retrying after server error"
        );
        tokio::time::sleep(policy.backoff).await;
        attempt += 1;
    }
}
