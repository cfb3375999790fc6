//! Content validation pipeline: gibberish screening, near-duplicate
//! rejection against the vector index, quality scoring, and insertion.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::gibberish;
use super::index::{ContentIndex, InsertOutcome, NewPost};
use crate::domains::scoring::config::{DUPLICATE_DISTANCE_THRESHOLD, ML_GIBBERISH_CONFIDENCE};
use crate::kernel::{BaseGibberishModel, BaseQualityModel};

/// Outcome of validating a post.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Accepted {
        /// 0-10 model rating
        quality: u8,
        /// True when the quality scorer fell back to its neutral default
        quality_degraded: bool,
        /// Nearest-neighbour distance clamped to [0, 1]; 1.0 for the first post
        originality: f64,
    },
    Rejected {
        reason: String,
    },
}

pub struct ContentValidator {
    index: ContentIndex,
    quality: Arc<dyn BaseQualityModel>,
    classifier: Option<Arc<dyn BaseGibberishModel>>,
}

impl ContentValidator {
    pub fn new(
        index: ContentIndex,
        quality: Arc<dyn BaseQualityModel>,
        classifier: Option<Arc<dyn BaseGibberishModel>>,
    ) -> Self {
        Self {
            index,
            quality,
            classifier,
        }
    }

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    /// Gibberish screening: rule and statistical passes, then the external
    /// classifier when configured. Classifier failures never block content.
    pub async fn check_gibberish(&self, text: &str) -> Option<String> {
        if let Some(reason) = gibberish::detect(text) {
            info!(reason, "gibberish detected by text analysis");
            return Some(format!("gibberish ({})", reason));
        }

        if let Some(classifier) = &self.classifier {
            match classifier.classify(text).await {
                Ok(prediction) => {
                    if prediction.label.eq_ignore_ascii_case("gibberish")
                        && prediction.confidence >= ML_GIBBERISH_CONFIDENCE
                    {
                        info!(
                            confidence = prediction.confidence,
                            "gibberish detected by classifier"
                        );
                        return Some("gibberish (classifier)".to_string());
                    }
                }
                Err(e) => {
                    // Fail open: an unavailable classifier must not block
                    // otherwise-valid content.
                    warn!(error = %e, "gibberish classifier unavailable; continuing");
                }
            }
        }

        None
    }

    /// Validate a post end to end. On acceptance the post has been inserted
    /// into the index and the quality and originality scores are returned.
    pub async fn validate(&self, post: &NewPost) -> Result<Validation> {
        // Redelivered jobs land here before the duplicate query would flag
        // the post against itself; report the id conflict instead.
        if self.index.exists(&post.post_id).await? {
            return Ok(Validation::Rejected {
                reason: "post_id conflict".to_string(),
            });
        }

        if post.content.trim().is_empty() {
            return Ok(Validation::Rejected {
                reason: "empty content".to_string(),
            });
        }

        if let Some(reason) = self.check_gibberish(&post.content).await {
            return Ok(Validation::Rejected { reason });
        }

        let nearest = self.index.nearest(&post.content).await?;
        if let Some(matched) = &nearest {
            if matched.distance <= DUPLICATE_DISTANCE_THRESHOLD {
                info!(
                    post_id = %post.post_id,
                    matched = %matched.post_id,
                    distance = matched.distance,
                    "duplicate content rejected"
                );
                return Ok(Validation::Rejected {
                    reason: format!("duplicate of {}", matched.post_id),
                });
            }
        }

        let assessment = self
            .quality
            .assess(&post.content, post.image.as_deref())
            .await;

        if self.index.insert(post).await? == InsertOutcome::Conflict {
            return Ok(Validation::Rejected {
                reason: "post_id conflict".to_string(),
            });
        }

        // The first post into an empty index is maximally original.
        let originality = nearest.map(|m| m.distance.min(1.0)).unwrap_or(1.0);

        Ok(Validation::Accepted {
            quality: assessment.score,
            quality_degraded: assessment.degraded,
            originality,
        })
    }
}
