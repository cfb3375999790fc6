//! Point accounting on top of the ledger store.
//!
//! Each operation runs a lock / mutate / save transaction per user, with the
//! month reset evaluated before every write. Transient database failures are
//! retried up to three times with backoff.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use super::models::{InteractionOutcome, UserScore};
use super::{config, store, Category};

const DB_ATTEMPTS: u32 = 3;
const DB_BACKOFF_MS: u64 = 100;

/// Quality and originality context for scoring a post.
#[derive(Debug, Clone, Copy)]
pub struct PostScore {
    /// 0-10 model rating
    pub quality: u8,
    /// Nearest-neighbour distance clamped to [0, 1]
    pub originality: f64,
}

/// Result of applying an interaction, ready for response mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyOutcome {
    Accepted {
        delta: f64,
        final_score: f64,
        awarded_at: DateTime<Utc>,
    },
    DailyLimited {
        final_score: f64,
    },
    MonthlyCapped {
        final_score: f64,
    },
}

impl ApplyOutcome {
    pub fn final_score(&self) -> f64 {
        match self {
            ApplyOutcome::Accepted { final_score, .. }
            | ApplyOutcome::DailyLimited { final_score }
            | ApplyOutcome::MonthlyCapped { final_score } => *final_score,
        }
    }
}

/// Result of crediting a one-time event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneTimeOutcome {
    /// False if the event had already been credited.
    pub accepted: bool,
    pub delta: f64,
    pub final_score: f64,
}

/// Applies point deltas to the ledger under daily-limit and monthly-cap rules.
#[derive(Clone)]
pub struct ScoringEngine {
    pool: PgPool,
}

impl ScoringEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply one interaction for `user_id`. Posts carry a [`PostScore`];
    /// all other categories award their fixed point value.
    pub async fn apply(
        &self,
        user_id: &str,
        category: Category,
        post: Option<PostScore>,
    ) -> Result<ApplyOutcome> {
        let mut last_error = None;
        for attempt in 0..DB_ATTEMPTS {
            match self.apply_once(user_id, category, post).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(
                        user_id,
                        category = category.as_str(),
                        attempt = attempt + 1,
                        error = %e,
                        "ledger write failed"
                    );
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(DB_BACKOFF_MS << attempt)).await;
                }
            }
        }
        Err(last_error.expect("at least one attempt"))
    }

    async fn apply_once(
        &self,
        user_id: &str,
        category: Category,
        post: Option<PostScore>,
    ) -> Result<ApplyOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut record = store::lock(&mut tx, user_id).await?;

        record.maybe_month_reset(now.date_naive());

        let base_points = match post {
            Some(score) => config::qualitative_post_points(score.quality, score.originality),
            None => category.point_value(),
        };

        let outcome = record.apply_interaction(category, base_points, now);

        // A month reset must persist even when the interaction itself is
        // rejected, so the record is always saved.
        store::save(&mut tx, &record).await?;
        tx.commit().await?;

        let final_score = record.normalized_score();
        Ok(match outcome {
            InteractionOutcome::Accepted { delta, awarded_at } => {
                info!(
                    user_id,
                    category = category.as_str(),
                    delta,
                    final_score,
                    "interaction scored"
                );
                ApplyOutcome::Accepted {
                    delta,
                    final_score,
                    awarded_at,
                }
            }
            InteractionOutcome::DailyLimited => {
                info!(
                    user_id,
                    category = category.as_str(),
                    limit = category.daily_limit(),
                    "daily limit reached"
                );
                ApplyOutcome::DailyLimited { final_score }
            }
            InteractionOutcome::MonthlyCapped => {
                info!(
                    user_id,
                    category = category.as_str(),
                    cap = category.monthly_cap(),
                    "monthly cap reached"
                );
                ApplyOutcome::MonthlyCapped { final_score }
            }
        })
    }

    /// Credit a named one-time event; a repeated event id is a no-op.
    pub async fn apply_one_time(
        &self,
        user_id: &str,
        event_id: &str,
        points: f64,
    ) -> Result<OneTimeOutcome> {
        let mut last_error = None;
        for attempt in 0..DB_ATTEMPTS {
            match self.apply_one_time_once(user_id, event_id, points).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(user_id, event_id, attempt = attempt + 1, error = %e, "one-time write failed");
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(DB_BACKOFF_MS << attempt)).await;
                }
            }
        }
        Err(last_error.expect("at least one attempt"))
    }

    async fn apply_one_time_once(
        &self,
        user_id: &str,
        event_id: &str,
        points: f64,
    ) -> Result<OneTimeOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut record = store::lock(&mut tx, user_id).await?;

        record.maybe_month_reset(Utc::now().date_naive());
        let delta = record.record_one_time(event_id, points);

        store::save(&mut tx, &record).await?;
        tx.commit().await?;

        Ok(match delta {
            Some(delta) => {
                info!(user_id, event_id, delta, "one-time event credited");
                OneTimeOutcome {
                    accepted: true,
                    delta,
                    final_score: record.normalized_score(),
                }
            }
            None => {
                info!(user_id, event_id, "one-time event already credited");
                OneTimeOutcome {
                    accepted: false,
                    delta: 0.0,
                    final_score: record.normalized_score(),
                }
            }
        })
    }

    /// Reverse a deleted post's award. With an unknown delta nothing is
    /// subtracted; the totals never go negative.
    pub async fn refund_post(
        &self,
        user_id: &str,
        delta: f64,
        awarded_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if delta <= 0.0 {
            warn!(user_id, "refund requested with unknown delta; subtracting 0");
        }

        let mut tx = self.pool.begin().await?;
        let mut record = store::lock(&mut tx, user_id).await?;

        record.maybe_month_reset(Utc::now().date_naive());
        record.refund_post(delta, awarded_at);

        store::save(&mut tx, &record).await?;
        tx.commit().await?;

        info!(user_id, delta, "post award refunded");
        Ok(())
    }

    /// Current normalized 0-100 score; 0 for unknown users.
    pub async fn final_score(&self, user_id: &str) -> Result<f64> {
        Ok(store::fetch(&self.pool, user_id)
            .await?
            .map(|record| record.normalized_score())
            .unwrap_or(0.0))
    }

    /// Read-only peek at the record, for pre-checks and admin views.
    pub async fn user_record(&self, user_id: &str) -> Result<Option<UserScore>> {
        store::fetch(&self.pool, user_id).await
    }
}
