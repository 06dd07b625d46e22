//! Bounded retry with exponential backoff

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Options for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Maximum number of retries after the first attempt (default: 3)
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds (default: 5000)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds (default: 30000)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) to randomize delays (default: 0.1)
    pub jitter: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 5000,
            max_delay_ms: 30000,
            jitter: 0.1,
        }
    }
}

impl RetryOptions {
    /// Options that never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate delay for a given attempt with exponential backoff
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base_delay.min(self.max_delay_ms as f64);

        let jitter_amount = clamped * self.jitter * rand_float();
        let final_delay = clamped + jitter_amount;

        Duration::from_millis(final_delay as u64)
    }
}

/// Simple pseudo-random float between 0 and 1
fn rand_float() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(1))
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Retry an async operation with exponential backoff.
///
/// `is_retryable` decides per error whether another attempt makes sense;
/// errors it rejects are returned immediately. After `max_retries` failed
/// retries the last error is returned.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    options: &RetryOptions,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempt >= options.max_retries || !is_retryable(&error) {
                    return Err(error);
                }

                let delay = options.calculate_delay(attempt);
                tracing::warn!(
                    "Attempt {} failed: {}. Retrying in {:?}",
                    attempt + 1,
                    error,
                    delay
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> RetryOptions {
        RetryOptions {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            jitter: 0.0,
        }
    }

    #[test]
    fn test_calculate_delay() {
        let options = RetryOptions {
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            jitter: 0.0,
            ..Default::default()
        };

        assert_eq!(options.calculate_delay(0).as_millis(), 1000);
        assert_eq!(options.calculate_delay(1).as_millis(), 2000);
        assert_eq!(options.calculate_delay(2).as_millis(), 4000);
    }

    #[test]
    fn test_max_delay_clamping() {
        let options = RetryOptions {
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            jitter: 0.0,
            ..Default::default()
        };

        assert_eq!(options.calculate_delay(10).as_millis(), 5000);
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let result: Result<i32, &str> =
            retry_with_backoff(&fast(), |_| true, || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let mut attempts = 0;
        let result: Result<i32, String> = retry_with_backoff(
            &fast(),
            |_| false,
            || {
                attempts += 1;
                async { Err("unsupported".to_string()) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let mut attempts = 0;
        let result: Result<i32, String> = retry_with_backoff(
            &fast(),
            |_| true,
            || {
                attempts += 1;
                async { Err("query failed".to_string()) }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), "query failed");
        assert_eq!(attempts, 4);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let mut attempts = 0;
        let result: Result<u32, String> = retry_with_backoff(
            &fast(),
            |_| true,
            || {
                attempts += 1;
                let current = attempts;
                async move {
                    if current < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok(current)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_none_never_retries() {
        assert_eq!(RetryOptions::none().max_retries, 0);
    }
}
