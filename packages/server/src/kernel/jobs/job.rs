//! Job model for background command execution.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    DeadLetter,
}

/// How a job failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient error - will retry if attempts remain
    Retryable,
    /// Permanent error - straight to dead letter
    NonRetryable,
}

impl ErrorKind {
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorKind::Retryable)
    }
}

const COLUMNS: &str = "id, job_type, args, status, idempotency_key, max_retries, retry_count, \
     run_at, lease_expires_at, worker_id, error_message, created_at, updated_at";

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct Job {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    #[builder(setter(into))]
    pub job_type: String,

    #[builder(default, setter(strip_option))]
    pub args: Option<serde_json::Value>,

    #[builder(default)]
    pub status: JobStatus,

    #[builder(default, setter(strip_option))]
    pub idempotency_key: Option<String>,

    #[builder(default = 3)]
    pub max_retries: i32,

    #[builder(default = 0)]
    pub retry_count: i32,

    #[builder(default = Utc::now())]
    pub run_at: DateTime<Utc>,

    #[builder(default)]
    pub lease_expires_at: Option<DateTime<Utc>>,

    #[builder(default)]
    pub worker_id: Option<String>,

    #[builder(default)]
    pub error_message: Option<String>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,

    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Insert the job. Returns `false` when the partial unique index on the
    /// idempotency key swallowed the row (a live duplicate exists).
    pub async fn insert(&self, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO jobs (id, job_type, args, status, idempotency_key, max_retries, \
                               retry_count, run_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT DO NOTHING",
        )
        .bind(self.id)
        .bind(&self.job_type)
        .bind(&self.args)
        .bind(self.status)
        .bind(&self.idempotency_key)
        .bind(self.max_retries)
        .bind(self.retry_count)
        .bind(self.run_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let job =
            sqlx::query_as::<_, Self>(&format!("SELECT {} FROM jobs WHERE id = $1", COLUMNS))
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(job)
    }

    /// Live (pending or running) job holding an idempotency key.
    pub async fn find_by_idempotency_key(key: &str, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM jobs \
             WHERE idempotency_key = $1 AND status IN ('pending', 'running') \
             LIMIT 1",
            COLUMNS
        ))
        .bind(key)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Claim up to `limit` ready jobs for `worker_id`.
    ///
    /// Ready means pending with a due `run_at`, or running with an expired
    /// lease (a crashed worker's job becoming visible again).
    /// `FOR UPDATE SKIP LOCKED` keeps concurrent workers from colliding.
    pub async fn claim_jobs(
        limit: i64,
        worker_id: &str,
        lease_seconds: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(&format!(
            "UPDATE jobs \
             SET status = 'running', \
                 worker_id = $1, \
                 lease_expires_at = now() + make_interval(secs => $2::float8), \
                 updated_at = now() \
             WHERE id IN ( \
                 SELECT id FROM jobs \
                 WHERE (status = 'pending' AND run_at <= now()) \
                    OR (status = 'running' AND lease_expires_at < now()) \
                 ORDER BY run_at \
                 LIMIT $3 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {}",
            COLUMNS
        ))
        .bind(worker_id)
        .bind(lease_seconds)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let job = Job::builder().job_type("post:process").build();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.max_retries, 3);
        assert_eq!(job.retry_count, 0);
        assert!(job.idempotency_key.is_none());
    }

    #[test]
    fn error_kinds_drive_retry() {
        assert!(ErrorKind::Retryable.should_retry());
        assert!(!ErrorKind::NonRetryable.should_retry());
    }
}
