//! Server dependencies (using traits for testability)
//!
//! Central dependency container constructed once at startup and passed
//! explicitly into routes, workers, and the scheduler. External services sit
//! behind trait objects so tests can substitute them.

use std::sync::Arc;

use sqlx::PgPool;

use super::webhook::WebhookDispatcher;
use super::{BaseEmbeddingService, BaseGibberishModel, BaseQualityModel};
use crate::domains::content::{ContentIndex, ContentValidator};
use crate::domains::scoring::ScoringEngine;

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub embedding_service: Arc<dyn BaseEmbeddingService>,
    pub quality_model: Arc<dyn BaseQualityModel>,
    /// External gibberish classifier; optional, fail-open
    pub gibberish_model: Option<Arc<dyn BaseGibberishModel>>,
    pub webhook_dispatcher: Arc<WebhookDispatcher>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        embedding_service: Arc<dyn BaseEmbeddingService>,
        quality_model: Arc<dyn BaseQualityModel>,
        gibberish_model: Option<Arc<dyn BaseGibberishModel>>,
        webhook_dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        Self {
            db_pool,
            embedding_service,
            quality_model,
            gibberish_model,
            webhook_dispatcher,
        }
    }

    pub fn scoring_engine(&self) -> ScoringEngine {
        ScoringEngine::new(self.db_pool.clone())
    }

    pub fn content_index(&self) -> ContentIndex {
        ContentIndex::new(self.db_pool.clone(), self.embedding_service.clone())
    }

    pub fn content_validator(&self) -> ContentValidator {
        ContentValidator::new(
            self.content_index(),
            self.quality_model.clone(),
            self.gibberish_model.clone(),
        )
    }
}
