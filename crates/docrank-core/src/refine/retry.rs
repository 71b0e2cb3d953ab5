use std::time::Duration;

use super::{RefineError, RefineFuture, Refiner};

/// Timeout and backoff settings for calls to an unreliable refiner.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(120),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given 0-based attempt, capped at
    /// `max_backoff`, plus up to 25% random jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let base = self
            .base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);
        let jitter_ms = (base.as_millis() as u64) / 4;
        base + Duration::from_millis(fastrand::u64(0..=jitter_ms))
    }
}

/// Applies a [`RetryPolicy`] around another refiner.
pub struct RetryingRefiner<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R: Refiner> RetryingRefiner<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Refiner> Refiner for RetryingRefiner<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn refine<'a>(&'a self, text: &'a str, persona: &'a str, job: &'a str) -> RefineFuture<'a> {
        Box::pin(async move {
            let attempts = self.policy.max_retries + 1;
            let mut last_error = String::new();

            for attempt in 0..attempts {
                let result =
                    match tokio::time::timeout(self.policy.timeout, self.inner.refine(text, persona, job)).await {
                        Ok(result) => result,
                        Err(_) => Err(RefineError::Timeout(self.policy.timeout)),
                    };

                let err = match result {
                    Ok(refined) => return Ok(refined),
                    Err(err) if !err.is_retryable() => return Err(err),
                    Err(err) => err,
                };

                last_error = err.to_string();
                if attempt + 1 < attempts {
                    let wait = self.policy.backoff(attempt);
                    tracing::warn!(
                        refiner = self.inner.name(),
                        attempt = attempt + 1,
                        error = %err,
                        backoff_ms = wait.as_millis() as u64,
                        "refine failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }

            Err(RefineError::Exhausted {
                attempts,
                last: last_error,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::mock::{MockRefiner, MockResponse};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            timeout: Duration::from_secs(5),
            base_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = fast_policy(3);
        let first = policy.backoff(0);
        assert!(first >= Duration::from_millis(10) && first <= Duration::from_millis(12));
        let capped = policy.backoff(10);
        assert!(capped >= Duration::from_millis(50) && capped <= Duration::from_millis(62));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let mock = MockRefiner::with_sequence(vec![
            MockResponse::Fail { retryable: true },
            MockResponse::Fail { retryable: true },
            MockResponse::Text("ok".into()),
        ]);
        let refiner = RetryingRefiner::new(mock, fast_policy(2));
        assert_eq!(refiner.refine("t", "p", "j").await.unwrap(), "ok");
        assert_eq!(refiner.inner().call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_reply_is_returned_without_retry() {
        let refiner = RetryingRefiner::new(MockRefiner::new(MockResponse::Text(String::new())), fast_policy(2));
        assert_eq!(refiner.refine("t", "p", "j").await.unwrap(), "");
        assert_eq!(refiner.inner().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let mock = MockRefiner::new(MockResponse::Fail { retryable: true });
        let refiner = RetryingRefiner::new(mock, fast_policy(1));
        let err = refiner.refine("t", "p", "j").await.unwrap_err();
        assert!(matches!(err, RefineError::Exhausted { attempts: 2, .. }));
        assert_eq!(refiner.inner().call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_fails_fast() {
        let mock = MockRefiner::new(MockResponse::Fail { retryable: false });
        let refiner = RetryingRefiner::new(mock, fast_policy(3));
        let err = refiner.refine("t", "p", "j").await.unwrap_err();
        assert!(matches!(err, RefineError::Other(_)));
        assert_eq!(refiner.inner().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_call_times_out() {
        let mock = MockRefiner::new(MockResponse::Hang);
        let refiner = RetryingRefiner::new(mock, fast_policy(0));
        let err = refiner.refine("t", "p", "j").await.unwrap_err();
        assert!(matches!(err, RefineError::Exhausted { attempts: 1, .. }));
        assert!(err.to_string().contains("timed out"));
    }
}
