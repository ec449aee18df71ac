use std::future::Future;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Result, VeracityError};

/// Failure classes a [`RetryPolicy`] may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableKind {
    /// Provider quota or rate limit (HTTP 429, resource exhausted).
    RateLimit,
    /// Network failures and provider-side 5xx errors.
    Transient,
}

impl RetryableKind {
    pub fn of(error: &VeracityError) -> Option<Self> {
        match error {
            VeracityError::LlmRateLimit { .. } => Some(Self::RateLimit),
            VeracityError::LlmTransient(_) => Some(Self::Transient),
            _ => None,
        }
    }
}

/// Bounded exponential backoff.
///
/// The first attempt runs immediately; attempt `n` (1-based, `n > 1`) waits
/// `base_delay * multiplier^(n - 2)` capped at `max_delay`, or the
/// provider's `retry_after` when it asks for longer.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub retry_on: Vec<RetryableKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            retry_on: vec![RetryableKind::RateLimit, RetryableKind::Transient],
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            multiplier: config.retry_multiplier,
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            ..Self::default()
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let delay_secs = self.base_delay.as_secs_f64() * factor;

        // Overflowed, NaN or negative products sleep for the cap.
        if !(factor.is_finite() && factor >= 0.0)
            || delay_secs >= self.max_delay.as_secs_f64()
        {
            return self.max_delay;
        }
        self.base_delay.mul_f64(factor)
    }

    fn should_retry(&self, error: &VeracityError) -> bool {
        RetryableKind::of(error).is_some_and(|kind| self.retry_on.contains(&kind))
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && self.should_retry(&error) => {
                    let mut delay = self.delay_for(attempt);
                    if let VeracityError::LlmRateLimit {
                        retry_after: Some(secs),
                    } = &error
                    {
                        delay = delay.max(Duration::from_secs(*secs));
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "LLM call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_delays_grow_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delays_are_capped_at_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 100,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(6), Duration::from_secs(30));
        assert_eq!(policy.delay_for(70), Duration::from_secs(30));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));

        let runaway = RetryPolicy {
            multiplier: f64::INFINITY,
            max_delay: Duration::from_millis(250),
            ..RetryPolicy::default()
        };
        assert_eq!(runaway.delay_for(3), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_retries_rate_limit_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast_policy(3)
            .run(move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(VeracityError::LlmRateLimit { retry_after: None })
                } else {
                    Ok("answer")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = fast_policy(3)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VeracityError::LlmRateLimit { retry_after: None })
            })
            .await;

        assert!(matches!(result, Err(VeracityError::LlmRateLimit { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = fast_policy(3)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VeracityError::Llm("LLM authentication failed".to_string()))
            })
            .await;

        assert!(matches!(result, Err(VeracityError::Llm(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_on_limits_kinds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy {
            retry_on: vec![RetryableKind::RateLimit],
            ..fast_policy(3)
        };
        let result: Result<()> = policy
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VeracityError::LlmTransient("502".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
