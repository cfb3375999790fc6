//! Ollama API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Generation
// =============================================================================

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model to use (e.g., "qwen2.5vl", "llama3")
    pub model: String,

    /// The prompt to complete
    pub prompt: String,

    /// Always false here; streaming is not supported by this client
    pub stream: bool,

    /// Base64-encoded images for multimodal models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl GenerateRequest {
    /// Create a new non-streaming generate request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            images: None,
        }
    }

    /// Attach a base64-encoded image.
    pub fn image(mut self, image_b64: String) -> Self {
        self.images.get_or_insert_with(Vec::new).push(image_b64);
        self
    }
}

/// Response body for `POST /api/generate` (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

// =============================================================================
// Embeddings
// =============================================================================

/// Request body for `POST /api/embeddings`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub prompt: String,
}

/// Response body for `POST /api/embeddings`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsResponse {
    pub embedding: Vec<f32>,
}

// =============================================================================
// Model listing
// =============================================================================

/// Response body for `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// A locally available model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}
