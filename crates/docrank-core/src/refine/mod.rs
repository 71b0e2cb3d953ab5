//! Refinement of ranked sections into the `refined_text` of the output.
//!
//! A [`Refiner`] is constructed once per run and passed to the pipeline.
//! [`SnippetRefiner`] is deterministic; [`ollama::OllamaRefiner`] calls an
//! external LLM service and is non-deterministic, so it is normally wrapped
//! in a [`retry::RetryingRefiner`].

pub mod mock;
pub mod ollama;
pub mod retry;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::snippet::snippet;

pub use retry::{RetryPolicy, RetryingRefiner};

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("refiner returned HTTP {0}")]
    Status(u16),
    #[error("refiner timed out after {0:?}")]
    Timeout(Duration),
    #[error("refiner failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
    #[error("{0}")]
    Other(String),
}

impl RefineError {
    /// Transport failures, timeouts, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RefineError::Http(_) | RefineError::Timeout(_) => true,
            RefineError::Status(code) => *code == 429 || *code >= 500,
            RefineError::Exhausted { .. } | RefineError::Other(_) => false,
        }
    }
}

/// Future returned by [`Refiner::refine`].
pub type RefineFuture<'a> = Pin<Box<dyn Future<Output = Result<String, RefineError>> + Send + 'a>>;

/// Turns the text of a ranked section into a short, persona-aware summary.
pub trait Refiner: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn refine<'a>(&'a self, text: &'a str, persona: &'a str, job: &'a str) -> RefineFuture<'a>;
}

impl<R: Refiner + ?Sized> Refiner for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn refine<'a>(&'a self, text: &'a str, persona: &'a str, job: &'a str) -> RefineFuture<'a> {
        (**self).refine(text, persona, job)
    }
}

/// Deterministic refiner: the leading sentences of the text, see [`snippet`].
#[derive(Debug, Clone, Copy)]
pub struct SnippetRefiner {
    limit: usize,
}

impl SnippetRefiner {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for SnippetRefiner {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SNIPPET_LIMIT)
    }
}

impl Refiner for SnippetRefiner {
    fn name(&self) -> &str {
        "snippet"
    }

    fn refine<'a>(&'a self, text: &'a str, _persona: &'a str, _job: &'a str) -> RefineFuture<'a> {
        let out = snippet(text, self.limit);
        Box::pin(async move { Ok(out) })
    }
}

/// Prompt sent to the rewrite service.
pub fn build_prompt(text: &str, persona: &str, job: &str) -> String {
    format!(
        "You are helping a {persona}. They are working on the following job: {job}\n\n\
         Below is a section of a document. Rewrite or summarize it in a way that captures \
         the most relevant and refined content for that purpose.\n\n\
         SECTION:\n{text}\n\n\
         REFINED VERSION:\n"
    )
}
