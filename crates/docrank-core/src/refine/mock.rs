//! Mock refiner for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{RefineError, RefineFuture, Refiner};

/// A configurable mock response for [`MockRefiner`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this text.
    Text(String),
    /// Return the input text, trimmed.
    Echo,
    /// Fail with a 503 (`retryable`) or a non-retryable error.
    Fail { retryable: bool },
    /// Never complete.
    Hang,
}

/// A hand-rolled mock implementing [`Refiner`] for tests.
///
/// Returns a fixed response or a sequence of responses (repeating the last),
/// and records each call's persona and job.
pub struct MockRefiner {
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    call_count: AtomicUsize,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockRefiner {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        responses.reverse();
        let fallback = responses.first().cloned().unwrap();
        Self {
            responses: Mutex::new(responses),
            fallback,
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// How many times `refine()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// `(persona, job)` of every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockResponse {
        let mut seq = self.responses.lock().unwrap();
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl Refiner for MockRefiner {
    fn name(&self) -> &str {
        "mock"
    }

    fn refine<'a>(&'a self, text: &'a str, persona: &'a str, job: &'a str) -> RefineFuture<'a> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((persona.to_string(), job.to_string()));
        let response = self.next_response();

        Box::pin(async move {
            match response {
                MockResponse::Text(s) => Ok(s),
                MockResponse::Echo => Ok(text.trim().to_string()),
                MockResponse::Fail { retryable: true } => Err(RefineError::Status(503)),
                MockResponse::Fail { retryable: false } => {
                    Err(RefineError::Other("mock refiner failure".into()))
                }
                MockResponse::Hang => std::future::pending().await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_then_repeat_last() {
        let mock = MockRefiner::with_sequence(vec![
            MockResponse::Text("first".into()),
            MockResponse::Echo,
        ]);
        assert_eq!(mock.refine(" body ", "p", "j").await.unwrap(), "first");
        assert_eq!(mock.refine(" body ", "p", "j").await.unwrap(), "body");
        assert_eq!(mock.refine("again", "p", "j").await.unwrap(), "again");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn failures_carry_retryability() {
        let retryable = MockRefiner::new(MockResponse::Fail { retryable: true });
        assert!(retryable.refine("t", "p", "j").await.unwrap_err().is_retryable());
        let fatal = MockRefiner::new(MockResponse::Fail { retryable: false });
        assert!(!fatal.refine("t", "p", "j").await.unwrap_err().is_retryable());
    }
}
