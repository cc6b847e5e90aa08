//! Retry logic with exponential backoff
//!
//! Upload endpoints on all three platforms intermittently return 5xx or
//! rate-limit responses; those calls are retried with exponential backoff.
//! Anything that looks like a permanent rejection fails immediately.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry manager for executing upload calls with exponential backoff
///
/// # Examples
///
/// ```no_run
/// use mod_publisher::core::{RetryManager, RetryOptions};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let manager = RetryManager::new(RetryOptions::default());
///
///     let result = manager.retry(|| async {
///         Ok::<_, anyhow::Error>("uploaded")
///     }).await?;
///
///     Ok(())
/// }
/// ```
pub struct RetryManager {
    options: RetryOptions,
}

impl RetryManager {
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Execute the given async operation, retrying transient failures
    pub async fn retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.options.initial_delay;
        let mut last_error: Option<E> = None;

        for attempt in 1..=self.options.max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !self.is_retryable_error(&error) {
                        return Err(error);
                    }

                    if attempt >= self.options.max_attempts {
                        return Err(error);
                    }

                    last_error = Some(error);

                    sleep(delay).await;
                    delay = Duration::from_secs_f64(
                        delay.as_secs_f64() * self.options.backoff_multiplier,
                    )
                    .min(self.options.max_delay);
                }
            }
        }

        // Unreachable: the loop always returns on the last attempt
        Err(last_error.unwrap())
    }

    /// Check if an error should be retried
    ///
    /// Transient network failures, timeouts, rate limits and server-side
    /// errors are retryable. Auth failures and validation rejections are not.
    fn is_retryable_error<E: std::fmt::Display>(&self, error: &E) -> bool {
        let error_msg = error.to_string().to_lowercase();

        let retryable_patterns = [
            "timeout",
            "timed out",
            "connection refused",
            "connection reset",
            "network error",
            "socket hang up",
            "429",
            "500 internal server error",
            "502",
            "503",
            "504",
            "temporarily unavailable",
        ];

        retryable_patterns
            .iter()
            .any(|pattern| error_msg.contains(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_options() -> RetryOptions {
        RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let manager = RetryManager::new(RetryOptions::default());

        let result = manager.retry(|| async { Ok::<_, anyhow::Error>(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_transient_failures() {
        let manager = RetryManager::new(fast_options());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(move || {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err(anyhow::anyhow!("503 Service Unavailable"))
                    } else {
                        Ok::<_, anyhow::Error>("uploaded")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "uploaded");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_reached() {
        let manager = RetryManager::new(fast_options());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                async move { Err::<i32, _>(anyhow::anyhow!("connection reset")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_rejection_fails_immediately() {
        let manager = RetryManager::new(RetryOptions::default());
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                async move { Err::<i32, _>(anyhow::anyhow!("401 Unauthorized")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_patterns() {
        let manager = RetryManager::new(RetryOptions::default());

        for error_msg in [
            "request timed out",
            "connection refused",
            "429 Too Many Requests",
            "502 Bad Gateway",
            "503 Service Unavailable",
        ] {
            assert!(
                manager.is_retryable_error(&anyhow::anyhow!("{}", error_msg)),
                "Expected '{}' to be retryable",
                error_msg
            );
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_patterns() {
        let manager = RetryManager::new(RetryOptions::default());

        for error_msg in ["401 Unauthorized", "404 Not Found", "invalid game version"] {
            assert!(
                !manager.is_retryable_error(&anyhow::anyhow!("{}", error_msg)),
                "Expected '{}' not to be retryable",
                error_msg
            );
        }
    }

    #[tokio::test]
    async fn test_exponential_backoff() {
        let manager = RetryManager::new(RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
        });

        let start = std::time::Instant::now();

        let _result = manager
            .retry(|| async { Err::<i32, _>(anyhow::anyhow!("timeout")) })
            .await;

        // Delays: 10ms + 20ms, no delay after the final attempt
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_retry_options_default() {
        let options = RetryOptions::default();

        assert_eq!(options.max_attempts, 3);
        assert_eq!(options.initial_delay, Duration::from_secs(1));
        assert_eq!(options.max_delay, Duration::from_secs(30));
        assert_eq!(options.backoff_multiplier, 2.0);
    }
}
