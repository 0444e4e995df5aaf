//! Retry with exponential backoff.
//!
//! The retry loop is an explicit attempt counter rather than nested error
//! handlers, so the ceiling and the backoff curve are testable on their own.

use crate::error::{GraderError, GraderResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff and ceiling configuration for grader calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first (ceiling of 3 per the contract).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Multiplier applied per attempt: `base × multiplier^(attempt-1)`.
    pub multiplier: f64,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Jitter factor in [0,1]; 0 disables jitter.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.1,
        }
    }
}

impl RetryConfig {
    /// Create the default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt ceiling.
    #[must_use]
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Set the base delay.
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the per-attempt multiplier.
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter factor.
    #[must_use]
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the attempt following `attempt` (1-indexed), honoring a
    /// server-provided hint when one exists.
    pub fn delay_after(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }
        let base = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32 - 1);
        let jitter = base * self.jitter * rand_jitter();
        Duration::from_secs_f64((base + jitter).max(0.0).min(self.max_delay.as_secs_f64()))
    }
}

/// Run `operation` until it succeeds, fails non-transiently, or the attempt
/// ceiling is reached.
///
/// Exhaustion surfaces as [`GraderError::Exhausted`] wrapping the final
/// transient error, so callers can tell "the service kept failing" apart
/// from "the request was bad".
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> GraderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = GraderResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        debug!(attempt, max_attempts = config.max_attempts, "grader attempt");

        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < config.max_attempts => {
                let wait = config.delay_after(attempt, error.retry_after());
                warn!(
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    %error,
                    "transient grader failure, backing off"
                );
                sleep(wait).await;
            }
            Err(error) if error.is_transient() => {
                warn!(attempt, %error, "grader retries exhausted");
                return Err(GraderError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }
            Err(error) => return Err(error),
        }
    }
}

/// Random factor in [-1, 1].
fn rand_jitter() -> f64 {
    use rand::Rng;
    rand::thread_rng().gen_range(-1.0..1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config() -> RetryConfig {
        RetryConfig::new()
            .base_delay(Duration::from_millis(1))
            .jitter(0.0)
    }

    #[test]
    fn test_delay_curve() {
        let config = RetryConfig::new()
            .base_delay(Duration::from_millis(100))
            .multiplier(2.0)
            .jitter(0.0);

        assert_eq!(config.delay_after(1, None), Duration::from_millis(100));
        assert_eq!(config.delay_after(2, None), Duration::from_millis(200));
        assert_eq!(config.delay_after(3, None), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_cap() {
        let config = RetryConfig::new()
            .base_delay(Duration::from_secs(1))
            .multiplier(10.0)
            .max_delay(Duration::from_secs(5))
            .jitter(0.0);

        assert_eq!(config.delay_after(6, None), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_after_hint_wins() {
        let config = fast_config();
        assert_eq!(
            config.delay_after(1, Some(Duration::from_millis(250))),
            Duration::from_millis(250)
        );
        // hints are still capped
        let capped = config.max_delay(Duration::from_secs(1));
        assert_eq!(
            capped.delay_after(1, Some(Duration::from_secs(60))),
            Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = with_retry(&fast_config(), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GraderError::transient_status(500, "flaky"))
                } else {
                    Ok("a fine answer")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "a fine answer");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_after_three_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: GraderResult<&str> = with_retry(&fast_config(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GraderError::transient_status(503, "down"))
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            GraderError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.is_transient());
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_error_fails_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: GraderResult<&str> = with_retry(&fast_config(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GraderError::auth("invalid key"))
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(result.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_invalid_input_fails_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: GraderResult<&str> = with_retry(&fast_config(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GraderError::invalid_input("empty prompt"))
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), GraderError::InvalidInput(_)));
    }
}
