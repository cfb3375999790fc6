//! HTTP client for the external gibberish classifier.
//!
//! The classifier is a black-box binary text model behind a small inference
//! endpoint. It is optional: when unconfigured or unreachable the validator
//! proceeds without it.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BaseGibberishModel, GibberishPrediction};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

pub struct HttpGibberishClassifier {
    client: Client,
    url: String,
}

impl HttpGibberishClassifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl BaseGibberishModel for HttpGibberishClassifier {
    async fn classify(&self, text: &str) -> Result<GibberishPrediction> {
        let response = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("classifier returned {}", status);
        }

        let predictions: Vec<LabelScore> = response.json().await?;
        let top = predictions
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("classifier returned no predictions"))?;

        debug!(label = %top.label, score = top.score, "classifier prediction");

        Ok(GibberishPrediction {
            label: top.label,
            confidence: top.score,
        })
    }
}
