//! PostgreSQL-backed job queue.
//!
//! Commands serialize into the `jobs` table and workers claim them with
//! `FOR UPDATE SKIP LOCKED`. A lease acts as the visibility timeout: a job
//! whose worker died becomes claimable again once the lease expires, so
//! processing is at-least-once and handlers must be idempotent.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::job::{ErrorKind, Job};

/// Result of an enqueue, accounting for idempotency.
#[derive(Debug, Clone)]
pub enum EnqueueResult {
    /// Command was enqueued, returns new job ID
    Created(Uuid),
    /// A live job already holds this idempotency key
    Duplicate(Uuid),
}

impl EnqueueResult {
    pub fn job_id(&self) -> Uuid {
        match self {
            EnqueueResult::Created(id) | EnqueueResult::Duplicate(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, EnqueueResult::Created(_))
    }
}

/// Metadata commands provide for serialization.
pub trait CommandMeta {
    /// The command type name (used as job_type).
    fn command_type(&self) -> &'static str;

    /// Optional idempotency key; at most one pending/running job may hold it.
    fn idempotency_key(&self) -> Option<String> {
        None
    }

    /// Maximum retries for this command.
    fn max_retries(&self) -> i32 {
        3
    }
}

/// A claimed job ready for execution.
#[derive(Debug)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub job: Job,
}

impl ClaimedJob {
    /// Deserialize the command payload.
    pub fn deserialize<C: DeserializeOwned>(&self) -> Result<C> {
        let args = self
            .job
            .args
            .as_ref()
            .ok_or_else(|| anyhow!("job {} has no args", self.id))?;
        serde_json::from_value(args.clone())
            .map_err(|e| anyhow!("failed to deserialize command: {}", e))
    }

    pub fn command_type(&self) -> &str {
        &self.job.job_type
    }

    /// Whether this is the final allowed attempt.
    pub fn last_attempt(&self) -> bool {
        self.job.retry_count >= self.job.max_retries
    }
}

#[derive(Clone)]
pub struct PostgresJobQueue {
    pool: PgPool,
    lease_seconds: i64,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool, lease_seconds: i64) -> Self {
        Self {
            pool,
            lease_seconds,
        }
    }

    /// Enqueue a command for immediate execution.
    ///
    /// Returns [`EnqueueResult::Duplicate`] when a pending or running job
    /// already holds the command's idempotency key.
    pub async fn enqueue<C>(&self, command: C) -> Result<EnqueueResult>
    where
        C: Serialize + Send + CommandMeta,
    {
        if let Some(key) = command.idempotency_key() {
            if let Some(existing) = Job::find_by_idempotency_key(&key, &self.pool).await? {
                return Ok(EnqueueResult::Duplicate(existing.id));
            }
        }

        let job = Job::builder()
            .job_type(command.command_type())
            .args(serde_json::to_value(&command)?)
            .max_retries(command.max_retries())
            .build();
        let job = match command.idempotency_key() {
            Some(key) => Job {
                idempotency_key: Some(key),
                ..job
            },
            None => job,
        };

        // The partial unique index is the backstop for racing enqueues
        if !job.insert(&self.pool).await? {
            let existing = Job::find_by_idempotency_key(
                job.idempotency_key.as_deref().unwrap_or_default(),
                &self.pool,
            )
            .await?
            .ok_or_else(|| anyhow!("duplicate insert but no live job found"))?;
            return Ok(EnqueueResult::Duplicate(existing.id));
        }

        info!(job_id = %job.id, job_type = %job.job_type, "job enqueued");
        Ok(EnqueueResult::Created(job.id))
    }

    /// Claim up to `limit` ready jobs.
    pub async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>> {
        let jobs = Job::claim_jobs(limit, worker_id, self.lease_seconds, &self.pool).await?;
        Ok(jobs
            .into_iter()
            .map(|job| ClaimedJob { id: job.id, job })
            .collect())
    }

    /// Mark a job as successfully completed.
    pub async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE jobs \
             SET status = 'succeeded', lease_expires_at = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a job as failed. Retryable failures with attempts remaining are
    /// re-queued with exponential backoff; the rest dead-letter.
    pub async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()> {
        let job = Job::find_by_id(job_id, &self.pool).await?;

        if kind.should_retry() && job.retry_count < job.max_retries {
            let delay_secs = 2i64.pow(job.retry_count as u32).min(3600);
            let retry_at = Utc::now() + chrono::Duration::seconds(delay_secs);

            sqlx::query(
                "UPDATE jobs \
                 SET status = 'pending', \
                     retry_count = retry_count + 1, \
                     run_at = $2, \
                     lease_expires_at = NULL, \
                     worker_id = NULL, \
                     error_message = $3, \
                     updated_at = now() \
                 WHERE id = $1",
            )
            .bind(job_id)
            .bind(retry_at)
            .bind(error)
            .execute(&self.pool)
            .await?;

            info!(
                job_id = %job_id,
                retry_at = %retry_at,
                attempt = job.retry_count + 1,
                "job scheduled for retry"
            );
        } else {
            sqlx::query(
                "UPDATE jobs \
                 SET status = 'dead_letter', \
                     error_message = $2, \
                     lease_expires_at = NULL, \
                     updated_at = now() \
                 WHERE id = $1",
            )
            .bind(job_id)
            .bind(error)
            .execute(&self.pool)
            .await?;

            info!(job_id = %job_id, error, "job dead-lettered");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_result_helpers() {
        let created = EnqueueResult::Created(Uuid::new_v4());
        assert!(created.is_created());

        let duplicate = EnqueueResult::Duplicate(Uuid::new_v4());
        assert!(!duplicate.is_created());
    }
}
