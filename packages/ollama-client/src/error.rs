//! Error types for the Ollama client.

use thiserror::Error;

/// Result type for Ollama client operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Ollama client errors.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Configuration error (invalid base URL, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OllamaError {
    /// Whether the error is worth retrying (network failures and server-side
    /// errors are transient; config and parse errors are not).
    pub fn is_transient(&self) -> bool {
        matches!(self, OllamaError::Network(_) | OllamaError::Api(_))
    }
}
