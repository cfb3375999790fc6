//! Scoring Service Server
//!
//! This binary wires the full stack: configuration, database pool and
//! migrations, the worker pool servicing the job queue, the daily analysis
//! scheduler, and the HTTP intake surface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ollama_client::OllamaClient;
use scoring_core::kernel::jobs::spawn_workers;
use scoring_core::kernel::{
    BaseGibberishModel, EmbeddingService, HttpGibberishClassifier, PostgresJobQueue,
    QualityScorer, ServerDeps, WebhookDispatcher,
};
use scoring_core::server::build_app;
use scoring_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scoring_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Scoring Service");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    // Model backends share one Ollama server
    let ollama = OllamaClient::new(config.ollama_url.clone())
        .with_timeout(Duration::from_secs(60))
        .context("Failed to build Ollama client")?;

    let embedding_service = Arc::new(EmbeddingService::new(
        ollama.clone(),
        config.embedding_model.clone(),
    ));
    let quality_model = Arc::new(QualityScorer::new(ollama, config.quality_model.clone()));

    let gibberish_model: Option<Arc<dyn BaseGibberishModel>> = match &config
        .gibberish_classifier_url
    {
        Some(url) => {
            tracing::info!("Gibberish classifier configured at {}", url);
            Some(Arc::new(HttpGibberishClassifier::new(url.clone())?))
        }
        None => {
            tracing::warn!("No gibberish classifier configured; rule-based checks only");
            None
        }
    };

    let webhook_dispatcher = Arc::new(WebhookDispatcher::new()?);

    let deps = Arc::new(ServerDeps::new(
        pool.clone(),
        embedding_service,
        quality_model,
        gibberish_model,
        webhook_dispatcher,
    ));

    // Worker pool for the job queue
    let queue = Arc::new(PostgresJobQueue::new(pool.clone(), config.job_lease_seconds));
    let shutdown = CancellationToken::new();
    let worker_handles = spawn_workers(
        deps.clone(),
        queue.clone(),
        config.worker_count,
        shutdown.clone(),
    );
    tracing::info!("Started {} job workers", config.worker_count);

    // Daily analysis scheduler
    let _scheduler = scoring_core::kernel::start_scheduler(pool.clone(), &config.analysis_cron)
        .await
        .context("Failed to start scheduler")?;

    // HTTP server
    let app = build_app(deps, queue);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    // Let in-flight jobs finish before exiting
    shutdown.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
