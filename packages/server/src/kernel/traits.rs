// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (validation order, scoring rules) lives in domain modules
// that consume these traits.
//
// Naming convention: Base* for trait names (e.g., BaseQualityModel)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Embedding Service Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseEmbeddingService: Send + Sync {
    /// Generate an embedding vector for text
    async fn generate(&self, text: &str) -> Result<Vec<f32>>;
}

// =============================================================================
// Quality Model Trait (Infrastructure)
// =============================================================================

/// A 0-10 content quality rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityAssessment {
    pub score: u8,
    /// True when the model was unreachable and the neutral default applied
    pub degraded: bool,
}

#[async_trait]
pub trait BaseQualityModel: Send + Sync {
    /// Rate content 0-10. Implementations degrade to a neutral default
    /// rather than failing, so the call is infallible by contract.
    async fn assess(&self, text: &str, image: Option<&[u8]>) -> QualityAssessment;
}

// =============================================================================
// Gibberish Classifier Trait (Infrastructure)
// =============================================================================

/// Label and confidence from the external binary classifier.
#[derive(Debug, Clone)]
pub struct GibberishPrediction {
    pub label: String,
    pub confidence: f64,
}

#[async_trait]
pub trait BaseGibberishModel: Send + Sync {
    /// Classify text; errors are treated as "unavailable" by callers
    /// (fail-open).
    async fn classify(&self, text: &str) -> Result<GibberishPrediction>;
}
