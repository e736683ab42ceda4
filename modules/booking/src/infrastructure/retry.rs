//! Retry/backoff wrapper around transactional Coordinator operations (5, 9).
//!
//! A single composable function rather than per-operation scattered retry
//! logic, applied uniformly to `STORE_CONFLICT` outcomes from the gateway:
//! exponential backoff with full jitter, capped attempts.

use std::time::Duration;

use rand::Rng;

use crate::config::BookingConfig;
use crate::error::BookingError;

/// Exponential-backoff-with-full-jitter policy, derived from
/// [`BookingConfig`] so the whole Coordinator shares one source of truth.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl From<&BookingConfig> for RetryPolicy {
    fn from(config: &BookingConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts,
            initial_delay: config.initial_retry_delay,
            multiplier: config.retry_backoff_multiplier,
            max_delay: config.max_retry_delay,
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the backoff window for a given attempt (0-indexed),
    /// before jitter is applied.
    fn delay_ceiling(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// A delay drawn uniformly from `[0, delay_ceiling(attempt)]` ("full
    /// jitter"), so that many clients racing the same lock don't retry in
    /// lockstep.
    fn jittered_delay(&self, attempt: u32) -> Duration {
        let ceiling = self.delay_ceiling(attempt);
        if ceiling.is_zero() {
            return ceiling;
        }
        let millis = rand::thread_rng().gen_range(0..=ceiling.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Runs `operation` up to `policy.max_attempts` times, retrying only on
/// [`BookingError::is_retryable`] outcomes with full-jitter exponential
/// backoff between attempts. The first call counts as attempt 1; a policy
/// with `max_attempts = 3` allows up to 2 retries after the initial try.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut operation: F) -> Result<T, BookingError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, BookingError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.jittered_delay(attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis(), error = %err, "store conflict, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_succeeds_without_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(fast_policy(3), || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BookingError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_store_conflict_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(fast_policy(3), || {
            let calls = calls_clone.clone();
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(BookingError::StoreConflict("deadlock".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, BookingError> = with_retry(fast_policy(3), || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BookingError::StoreConflict("deadlock".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(BookingError::StoreConflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_non_retryable_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, BookingError> = with_retry(fast_policy(3), || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BookingError::ReservationExpired)
            }
        })
        .await;

        assert!(matches!(result, Err(BookingError::ReservationExpired)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
