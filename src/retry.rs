use crate::{LfCircleError, Result};
use std::future::Future;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay for exponential backoff (in seconds)
    pub base_delay: u64,
    /// Maximum delay cap (in seconds)
    pub max_delay: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 5,
            max_delay: 300, // 5 minutes
        }
    }
}

impl RetryConfig {
    /// Never retry; rate limits are surfaced immediately.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retries` (0-based) given the server's hint.
    pub fn delay_for(&self, retries: u32, retry_after: u64) -> u64 {
        let backoff = self.base_delay.saturating_mul(2_u64.saturating_pow(retries));
        retry_after.saturating_add(backoff).min(self.max_delay)
    }
}

/// Result of a retry operation with context
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub result: T,
    /// Number of retry attempts made
    pub attempts_made: u32,
    /// Total time spent waiting between attempts (in seconds)
    pub total_retry_time: u64,
}

/// Execute an async operation, retrying it while it fails with
/// [`LfCircleError::RateLimit`].
///
/// # Arguments
/// * `config` - Retry configuration
/// * `operation_name` - Name of the operation for logging
/// * `operation` - Async function that returns a Result
/// * `on_rate_limit` - Callback for rate limit events (delay in seconds)
///
/// Any other error is returned immediately.
pub async fn retry_with_backoff<T, F, Fut, OnRateLimit>(
    config: RetryConfig,
    operation_name: &str,
    mut operation: F,
    mut on_rate_limit: OnRateLimit,
) -> Result<RetryResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    OnRateLimit: FnMut(u64, &str),
{
    let mut retries = 0;
    let mut total_retry_time = 0;

    loop {
        match operation().await {
            Ok(result) => {
                return Ok(RetryResult {
                    result,
                    attempts_made: retries,
                    total_retry_time,
                });
            }
            Err(LfCircleError::RateLimit { retry_after }) => {
                if retries >= config.max_retries {
                    log::warn!(
                        "Max retries ({}) exceeded for {}",
                        config.max_retries,
                        operation_name
                    );
                    return Err(LfCircleError::RateLimit { retry_after });
                }

                let delay = config.delay_for(retries, retry_after);

                log::info!(
                    "{} rate limited. Waiting {} seconds before retry {} of {}",
                    operation_name,
                    delay,
                    retries + 1,
                    config.max_retries
                );

                on_rate_limit(delay, operation_name);

                tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
                retries += 1;
                total_retry_time += delay;
            }
            Err(other_error) => {
                return Err(other_error);
            }
        }
    }
}
