use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub ollama_url: String,
    pub quality_model: String,
    pub embedding_model: String,
    pub gibberish_classifier_url: Option<String>,
    pub worker_count: usize,
    pub job_lease_seconds: i64,
    pub analysis_cron: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        // Validate required environment variables and warn about optional ones
        Self::validate_env_vars();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            quality_model: env::var("QUALITY_MODEL").unwrap_or_else(|_| "qwen2.5vl".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            gibberish_classifier_url: env::var("GIBBERISH_CLASSIFIER_URL").ok(),
            worker_count: env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("WORKER_COUNT must be a valid number")?,
            job_lease_seconds: env::var("JOB_LEASE_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("JOB_LEASE_SECONDS must be a valid number")?,
            analysis_cron: env::var("ANALYSIS_CRON").unwrap_or_else(|_| "0 0 0 * * *".to_string()),
        })
    }

    /// Validate environment variables and print warnings
    fn validate_env_vars() {
        let required_vars = vec!["DATABASE_URL"];

        let optional_vars = vec![
            ("PORT", "8080"),
            ("OLLAMA_URL", "http://localhost:11434"),
            ("QUALITY_MODEL", "qwen2.5vl"),
            ("EMBEDDING_MODEL", "nomic-embed-text"),
            ("GIBBERISH_CLASSIFIER_URL", "disabled"),
            ("WORKER_COUNT", "4"),
            ("JOB_LEASE_SECONDS", "300"),
            ("ANALYSIS_CRON", "daily at midnight UTC"),
        ];

        let mut missing_required = Vec::new();
        let mut missing_optional = Vec::new();

        // Check required variables
        for var in &required_vars {
            if env::var(var).is_err() {
                missing_required.push(*var);
            }
        }

        // Check optional variables
        for (var, default) in &optional_vars {
            if env::var(var).is_err() {
                missing_optional.push((*var, *default));
            }
        }

        // Print warnings
        if !missing_optional.is_empty() {
            tracing::warn!("Optional environment variables not set (using defaults):");
            for (var, default) in missing_optional {
                tracing::warn!("  ⚠️  {} (default: {})", var, default);
            }
        }

        if !missing_required.is_empty() {
            tracing::error!("❌ Required environment variables are missing:");
            for var in &missing_required {
                tracing::error!("  ❌  {}", var);
            }
            tracing::error!("Server will fail to start without these variables!");
        } else {
            tracing::info!("✅ All required environment variables are present");
        }
    }
}
