//! Job worker pool.
//!
//! Each worker polls the queue, executes claimed commands, and records the
//! outcome. Workers race for jobs via `SKIP LOCKED` claims, so any number of
//! them can run; redelivery after a crash is bounded by the job lease.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::handlers;
use super::queue::{ClaimedJob, PostgresJobQueue};
use crate::kernel::ServerDeps;

/// Configuration for a job worker.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// Maximum number of jobs to claim at once
    pub batch_size: i64,
    /// How long to wait when no jobs are available
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            poll_interval: Duration::from_secs(1),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

pub struct JobWorker {
    deps: Arc<ServerDeps>,
    queue: Arc<PostgresJobQueue>,
    config: JobWorkerConfig,
}

impl JobWorker {
    pub fn new(deps: Arc<ServerDeps>, queue: Arc<PostgresJobQueue>, config: JobWorkerConfig) -> Self {
        Self {
            deps,
            queue,
            config,
        }
    }

    /// Poll-execute loop until shutdown.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            "job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let jobs = match self
                .queue
                .claim(&self.config.worker_id, self.config.batch_size)
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to claim jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if jobs.is_empty() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
                continue;
            }

            debug!(count = jobs.len(), "claimed jobs");

            let mut handles = Vec::with_capacity(jobs.len());
            for job in jobs {
                handles.push(self.process_job(job));
            }
            futures::future::join_all(handles).await;
        }

        info!(worker_id = %self.config.worker_id, "job worker stopped");
    }

    async fn process_job(&self, job: ClaimedJob) {
        let job_id = job.id;
        let job_type = job.command_type().to_string();

        match handlers::execute(&self.deps, &self.queue, &job).await {
            Ok(()) => {
                debug!(job_id = %job_id, job_type = %job_type, "job succeeded");
                if let Err(e) = self.queue.mark_succeeded(job_id).await {
                    error!(job_id = %job_id, error = %e, "failed to mark job as succeeded");
                }
            }
            Err(failure) => {
                warn!(
                    job_id = %job_id,
                    job_type = %job_type,
                    error = %failure.error,
                    "job failed"
                );
                if let Err(e) = self
                    .queue
                    .mark_failed(job_id, &failure.error.to_string(), failure.kind)
                    .await
                {
                    error!(job_id = %job_id, error = %e, "failed to mark job as failed");
                }
            }
        }
    }
}

/// Spawn `count` workers sharing the queue; returns their join handles.
pub fn spawn_workers(
    deps: Arc<ServerDeps>,
    queue: Arc<PostgresJobQueue>,
    count: usize,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|i| {
            let config = JobWorkerConfig {
                worker_id: format!("worker-{}", i),
                ..Default::default()
            };
            let worker = JobWorker::new(deps.clone(), queue.clone(), config);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        })
        .collect()
}
