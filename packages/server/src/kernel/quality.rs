//! Content quality scoring via a remote generative model.
//!
//! The model is asked for a single 0-10 number; the first integer in the
//! response is parsed and clamped. Transport errors, timeouts, and parse
//! failures retry with exponential backoff inside a fixed total budget, and
//! a final failure degrades to a neutral score instead of failing the post.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use lazy_static::lazy_static;
use ollama_client::{GenerateRequest, OllamaClient};
use regex::Regex;
use tracing::{info, warn};

use super::{BaseQualityModel, QualityAssessment};

/// Score applied when the model cannot be reached or parsed.
const NEUTRAL_SCORE: u8 = 5;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 2;

/// Wall-clock budget for all attempts combined.
const TOTAL_BUDGET: Duration = Duration::from_secs(60);

lazy_static! {
    static ref FIRST_INTEGER: Regex = Regex::new(r"\d+").unwrap();
}

pub struct QualityScorer {
    client: OllamaClient,
    model: String,
}

impl QualityScorer {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn build_prompt(text: &str, has_image: bool) -> String {
        let image_line = if has_image {
            "Image: [An image is provided]"
        } else {
            "Image: [No image]"
        };
        format!(
            "You are a meticulous Content Quality Analyst. Your task is to rate a user's post \
             on a scale of 0 to 10 based on effort, creativity, and clarity. You MUST respond \
             with only a single number and nothing else.\n\n\
             Here is an example:\n\
             Post Text: \"my vacation\"\n\
             Image: [An image of a beach]\n\
             Your Response: 2\n\n\
             Now, analyze the following post:\n\
             Post Text: \"{}\"\n\
             {}\n\
             Your Response:",
            text, image_line
        )
    }

    async fn attempt_loop(&self, text: &str, image: Option<&[u8]>) -> Option<u8> {
        let mut request = GenerateRequest::new(&self.model, Self::build_prompt(text, image.is_some()));
        if let Some(bytes) = image {
            request = request.image(base64::engine::general_purpose::STANDARD.encode(bytes));
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match self.client.generate(request.clone()).await {
                Ok(response) => match parse_score(&response.response) {
                    Some(score) => {
                        info!(score, raw = %response.response.trim(), "quality score received");
                        return Some(score);
                    }
                    None => {
                        warn!(
                            attempt,
                            raw = %response.response.trim(),
                            "no integer in quality model response"
                        );
                    }
                },
                Err(e) => {
                    warn!(attempt, error = %e, "quality model request failed");
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(BACKOFF_BASE_SECS << (attempt - 1))).await;
            }
        }

        None
    }
}

#[async_trait]
impl BaseQualityModel for QualityScorer {
    async fn assess(&self, text: &str, image: Option<&[u8]>) -> QualityAssessment {
        match tokio::time::timeout(TOTAL_BUDGET, self.attempt_loop(text, image)).await {
            Ok(Some(score)) => QualityAssessment {
                score,
                degraded: false,
            },
            Ok(None) => {
                warn!("quality scorer exhausted retries; applying neutral default");
                QualityAssessment {
                    score: NEUTRAL_SCORE,
                    degraded: true,
                }
            }
            Err(_) => {
                warn!("quality scorer exceeded time budget; applying neutral default");
                QualityAssessment {
                    score: NEUTRAL_SCORE,
                    degraded: true,
                }
            }
        }
    }
}

/// First integer in the response, clamped to 0..=10.
pub fn parse_score(response: &str) -> Option<u8> {
    let matched = FIRST_INTEGER.find(response)?;
    let value: u32 = matched.as_str().parse().ok()?;
    Some(value.min(10) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_numbers() {
        assert_eq!(parse_score("8"), Some(8));
        assert_eq!(parse_score(" 10 "), Some(10));
    }

    #[test]
    fn parses_first_integer_in_chatter() {
        assert_eq!(parse_score("I would rate this post a 7 out of 10."), Some(7));
        assert_eq!(parse_score("Score: 3"), Some(3));
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(parse_score("42"), Some(10));
        assert_eq!(parse_score("999999999999999999999"), None); // overflows, no score
    }

    #[test]
    fn rejects_numberless_responses() {
        assert_eq!(parse_score("excellent post!"), None);
        assert_eq!(parse_score(""), None);
    }

    #[test]
    fn prompt_mentions_image_only_when_present() {
        let with = QualityScorer::build_prompt("hello", true);
        let without = QualityScorer::build_prompt("hello", false);
        assert!(with.contains("An image is provided"));
        assert!(without.contains("No image"));
    }
}
