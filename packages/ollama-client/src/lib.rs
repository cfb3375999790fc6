//! Pure Ollama REST API client
//!
//! A clean, minimal client for a local or remote Ollama server with no
//! domain-specific logic. Supports non-streaming generation (text and
//! multimodal) and embeddings.
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::{OllamaClient, GenerateRequest};
//!
//! let client = OllamaClient::new("http://localhost:11434");
//!
//! // Generation
//! let response = client
//!     .generate(GenerateRequest::new("qwen2.5vl", "Rate this post 0-10: ..."))
//!     .await?;
//!
//! // Embeddings
//! let embedding = client.embeddings("nomic-embed-text", "text to embed").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OllamaError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Pure Ollama API client.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new client for the given base URL (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from the `OLLAMA_URL` environment variable.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("OLLAMA_URL")
            .map_err(|_| OllamaError::Config("OLLAMA_URL not set".into()))?;
        Ok(Self::new(base_url))
    }

    /// Override the request timeout (default: reqwest's, effectively none).
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OllamaError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Non-streaming generation via `POST /api/generate`.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        debug!(
            model = %request.model,
            prompt_length = request.prompt.len(),
            has_images = request.images.is_some(),
            "Sending Ollama generate request"
        );

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Ollama generate request failed");
                OllamaError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Ollama API error");
            return Err(OllamaError::Api(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| OllamaError::Parse(format!("invalid generate response: {}", e)))
    }

    /// Generate an embedding via `POST /api/embeddings`.
    pub async fn embeddings(&self, model: &str, prompt: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
        };

        let response = self
            .http_client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Ollama embeddings request failed");
                OllamaError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(format!("invalid embeddings response: {}", e)))?;

        if body.embedding.is_empty() {
            return Err(OllamaError::Parse("empty embedding returned".into()));
        }

        Ok(body.embedding)
    }

    /// List locally available models via `GET /api/tags`.
    ///
    /// Doubles as a health check: a successful response means the server is up.
    pub async fn list_models(&self) -> Result<Vec<ModelTag>> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| OllamaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Api(format!("Ollama API error {}", status)));
        }

        let body: TagsResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(format!("invalid tags response: {}", e)))?;

        Ok(body.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn generate_request_builder() {
        let request = GenerateRequest::new("qwen2.5vl", "hello").image("aGVsbG8=".to_string());
        assert_eq!(request.model, "qwen2.5vl");
        assert!(!request.stream);
        assert_eq!(request.images.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn transient_errors_are_classified() {
        assert!(OllamaError::Network("timeout".into()).is_transient());
        assert!(OllamaError::Api("500".into()).is_transient());
        assert!(!OllamaError::Parse("bad json".into()).is_transient());
        assert!(!OllamaError::Config("no url".into()).is_transient());
    }

    #[tokio::test]
    #[ignore] // Requires a running Ollama server
    async fn test_list_models() {
        let client = OllamaClient::new("http://localhost:11434");
        let models = client.list_models().await.expect("Failed to list models");
        println!("Found {} models", models.len());
    }
}
