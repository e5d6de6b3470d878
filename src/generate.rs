use async_trait::async_trait;
use ollama_rs::Ollama;
use ollama_rs::error::OllamaError;
use ollama_rs::generation::completion::request::GenerationRequest;
use thiserror::Error;

use crate::context::PoemContext;

/// Fixed trivial prompt used by the availability probe.
pub const PROBE_PROMPT: &str = "Say hello.";

/// Failure modes of the generation collaborator. Both are absorbed into
/// the fallback path by the orchestrator, never surfaced to the end user.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The generation host could not be reached at the transport level.
    #[error("generation service unreachable: {0}")]
    Unreachable(String),
    /// The host answered but the response was unusable, including an empty
    /// generated field.
    #[error("malformed generation response: {0}")]
    Malformed(String),
}

impl From<OllamaError> for GenerateError {
    fn from(e: OllamaError) -> Self {
        match e {
            OllamaError::ReqwestError(inner) => GenerateError::Unreachable(inner.to_string()),
            other => GenerateError::Malformed(other.to_string()),
        }
    }
}

/// Pluggable seam over the generative model host.
#[async_trait]
pub trait PoemGenerator: Send + Sync {
    /// Lightweight availability check issued before the real call.
    async fn probe(&self) -> bool;

    /// Generates text for `prompt`, trimmed of surrounding whitespace.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Builds the generation prompt for a place at a moment. The derived
/// context, when available, is appended as an extra sentence.
pub fn build_prompt(place: &str, time: &str, date: &str, context: Option<&PoemContext>) -> String {
    let mut prompt = format!(
        "Write a poem about {place} at {time} on {date}. \
         The poem should be evocative and reflect the mood of the time and place."
    );
    if let Some(ctx) = context {
        prompt.push_str(&format!(" It is {} during {}.", ctx.time_of_day, ctx.season));
    }
    prompt
}

/// [`PoemGenerator`] backed by an Ollama host.
#[derive(Clone)]
pub struct OllamaPoet {
    client: Ollama,
    model: String,
}

impl OllamaPoet {
    /// Creates a client for the Ollama host at `base_url`.
    pub fn new(base_url: &str, model: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: Ollama::try_new(base_url)?,
            model: model.into(),
        })
    }

    /// Returns the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl PoemGenerator for OllamaPoet {
    async fn probe(&self) -> bool {
        let req = GenerationRequest::new(self.model.clone(), PROBE_PROMPT.to_string());
        match self.client.generate(req).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "generation probe failed");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let req = GenerationRequest::new(self.model.clone(), prompt.to_string());
        let resp = self.client.generate(req).await.map_err(GenerateError::from)?;
        let text = resp.response.trim().to_string();
        if text.is_empty() {
            return Err(GenerateError::Malformed("empty generated text".into()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::derive_context;
    use httpmock::prelude::*;
    use serde_json::json;

    fn generation_body(text: &str) -> serde_json::Value {
        json!({
            "model": "m",
            "created_at": "2025-03-01T09:57:00Z",
            "response": text,
            "done": true
        })
    }

    #[test]
    fn prompt_names_place_time_and_date() {
        let ctx = derive_context("09:57", "2025-03-01");
        let prompt = build_prompt("Reno, Nevada", "09:57", "2025-03-01", ctx.as_ref());
        assert!(prompt.contains("Reno, Nevada at 09:57 on 2025-03-01"));
        assert!(prompt.contains("It is morning during spring."));
    }

    #[test]
    fn prompt_without_context_has_no_context_sentence() {
        let prompt = build_prompt("Reno, Nevada", "09:57", "2025-03-01", None);
        assert!(prompt.contains("Reno, Nevada at 09:57 on 2025-03-01"));
        assert!(!prompt.contains("It is"));
    }

    #[tokio::test]
    async fn generate_trims_surrounding_whitespace() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(generation_body("\n  a poem of rain  \n"));
            })
            .await;
        let poet = OllamaPoet::new(&server.base_url(), "m").unwrap();
        let text = poet.generate("write").await.unwrap();
        assert_eq!(text, "a poem of rain");
    }

    #[tokio::test]
    async fn empty_generated_text_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(generation_body("   \n"));
            })
            .await;
        let poet = OllamaPoet::new(&server.base_url(), "m").unwrap();
        let err = poet.generate("write").await.unwrap_err();
        assert!(matches!(err, GenerateError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_unreachable() {
        let poet = OllamaPoet::new("http://127.0.0.1:1", "m").unwrap();
        let err = poet.generate("write").await.unwrap_err();
        assert!(matches!(err, GenerateError::Unreachable(_)));
        assert!(!poet.probe().await);
    }

    #[tokio::test]
    async fn probe_succeeds_against_live_host() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .body_contains(PROBE_PROMPT);
                then.status(200).json_body(generation_body("hello"));
            })
            .await;
        let poet = OllamaPoet::new(&server.base_url(), "m").unwrap();
        assert!(poet.probe().await);
        mock.assert_async().await;
    }
}
