use anyhow::{Context, Result};
use async_trait::async_trait;
use ollama_client::OllamaClient;

use super::BaseEmbeddingService;

/// Embedding service backed by an Ollama embedding model.
pub struct EmbeddingService {
    client: OllamaClient,
    model: String,
}

impl EmbeddingService {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseEmbeddingService for EmbeddingService {
    async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .client
            .embeddings(&self.model, text)
            .await
            .context("Failed to generate embedding")?;

        Ok(embedding)
    }
}
