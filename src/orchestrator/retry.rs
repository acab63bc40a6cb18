use crate::tts::SynthesisError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Bounded retry with exponential backoff: the delay before retry `n`
/// (0-based) is `base_delay * 2^n`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first try and is raised to 1 if zero.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn should_retry(&self, attempt: u32, error: &SynthesisError) -> bool {
        if attempt + 1 >= self.max_attempts {
            return false;
        }

        error.is_retryable()
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier)
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        let delay = self.delay_for(attempt);

        tracing::info!(
            "Retrying in {}ms (attempt {}/{})",
            delay.as_millis(),
            attempt + 2,
            self.max_attempts
        );
        sleep(delay).await;
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts. Returns the last result and the number of
    /// attempts made.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> (Result<T, SynthesisError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SynthesisError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return (Ok(value), attempt + 1),
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    if !self.should_retry(attempt, &e) {
                        return (Err(e), attempt + 1);
                    }
                    self.wait_before_retry(attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_should_retry_respects_budget_and_classification() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0, &SynthesisError::Timeout));
        assert!(policy.should_retry(1, &SynthesisError::Timeout));
        assert!(!policy.should_retry(2, &SynthesisError::Timeout));
        assert!(!policy.should_retry(0, &SynthesisError::EmptyAudio));
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = &AtomicU32::new(0);
        let (result, attempts) = policy
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(SynthesisError::Network("reset".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = &AtomicU32::new(0);
        let (result, attempts) = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(SynthesisError::Timeout)
            })
            .await;
        assert_eq!(result, Err(SynthesisError::Timeout));
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_stops_on_non_retryable() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let (result, attempts) = policy
            .run(|| async { Err::<(), _>(SynthesisError::EmptyAudio) })
            .await;
        assert_eq!(result, Err(SynthesisError::EmptyAudio));
        assert_eq!(attempts, 1);
    }
}
