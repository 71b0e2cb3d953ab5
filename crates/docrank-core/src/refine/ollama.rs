use serde::{Deserialize, Serialize};

use super::{RefineError, RefineFuture, Refiner, build_prompt};

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral";

/// Refiner backed by a local Ollama server (`/api/generate`, non-streaming).
///
/// No timeout is applied here; wrap it in a
/// [`RetryingRefiner`](super::RetryingRefiner) for timeouts and retries.
#[derive(Debug, Clone)]
pub struct OllamaRefiner {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaRefiner {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint_generate(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Refiner for OllamaRefiner {
    fn name(&self) -> &str {
        "ollama"
    }

    fn refine<'a>(&'a self, text: &'a str, persona: &'a str, job: &'a str) -> RefineFuture<'a> {
        Box::pin(async move {
            let req = GenerateRequest {
                model: &self.model,
                prompt: build_prompt(text, persona, job),
                stream: false,
            };

            let resp = self
                .client
                .post(self.endpoint_generate())
                .json(&req)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(RefineError::Status(status.as_u16()));
            }

            let parsed: GenerateResponse = resp.json().await?;
            Ok(refined_text(&parsed.response, &self.model))
        })
    }
}

/// The trimmed reply, kept even when blank.
fn refined_text(response: &str, model: &str) -> String {
    let refined = response.trim();
    if refined.is_empty() {
        tracing::warn!(model = %model, "Ollama returned a blank response");
    }
    refined.to_string()
}
