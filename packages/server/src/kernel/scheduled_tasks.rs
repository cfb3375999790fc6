//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The daily reward analysis is the one recurring task: on each tick it runs
//! the cohort engine over the full ledger. The analyzer holds its own
//! advisory lock, so an overlapping manual trigger is skipped rather than
//! doubled.

use anyhow::Result;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::cohorts::DailyAnalyzer;

/// Start all scheduled tasks. `analysis_cron` is a 6-field cron expression
/// in UTC (default: midnight daily).
pub async fn start_scheduler(pool: PgPool, analysis_cron: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let analysis_pool = pool.clone();
    let analysis_job = Job::new_async(analysis_cron, move |_uuid, _lock| {
        let pool = analysis_pool.clone();
        Box::pin(async move {
            if let Err(e) = run_daily_analysis(&pool).await {
                tracing::error!("Daily reward analysis failed: {}", e);
            }
        })
    })?;

    scheduler.add(analysis_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (daily reward analysis: '{}')", analysis_cron);
    Ok(scheduler)
}

async fn run_daily_analysis(pool: &PgPool) -> Result<()> {
    tracing::info!("Running scheduled daily reward analysis");

    let analyzer = DailyAnalyzer::new(pool.clone());
    match analyzer.run().await? {
        Some(cohorts) => {
            tracing::info!(run_date = %cohorts.run_date, "Daily reward analysis complete");
        }
        None => {
            tracing::warn!("Daily reward analysis skipped: another run holds the lock");
        }
    }

    Ok(())
}
