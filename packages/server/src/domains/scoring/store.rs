//! Durable access to the `user_scores` ledger.
//!
//! All point mutation goes through [`lock`] + [`save`] inside a transaction:
//! the row is created on first touch, then read under `FOR UPDATE` so that
//! concurrent interactions for the same user serialize at the database.

use anyhow::Result;
use sqlx::{PgPool, Postgres, Transaction};

use super::models::UserScore;

const COLUMNS: &str = "user_id, points_from_posts, points_from_likes, points_from_comments, \
     points_from_referrals, points_from_tipping, points_from_crypto, \
     one_time_points, one_time_events, last_reset_date, \
     daily_posts_timestamps, daily_likes_timestamps, daily_comments_timestamps, \
     daily_referrals_timestamps, daily_tipping_timestamps, daily_crypto_timestamps, \
     last_active_date, consecutive_activity_days, historical_engagement_score";

/// Create the row if missing and lock it for the current transaction.
pub async fn lock(tx: &mut Transaction<'_, Postgres>, user_id: &str) -> Result<UserScore> {
    sqlx::query("INSERT INTO user_scores (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    let record = sqlx::query_as::<_, UserScore>(&format!(
        "SELECT {} FROM user_scores WHERE user_id = $1 FOR UPDATE",
        COLUMNS
    ))
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

/// Write back every mutable column of a locked record.
pub async fn save(tx: &mut Transaction<'_, Postgres>, record: &UserScore) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE user_scores
        SET points_from_posts = $2,
            points_from_likes = $3,
            points_from_comments = $4,
            points_from_referrals = $5,
            points_from_tipping = $6,
            points_from_crypto = $7,
            one_time_points = $8,
            one_time_events = $9,
            last_reset_date = $10,
            daily_posts_timestamps = $11,
            daily_likes_timestamps = $12,
            daily_comments_timestamps = $13,
            daily_referrals_timestamps = $14,
            daily_tipping_timestamps = $15,
            daily_crypto_timestamps = $16,
            last_active_date = $17,
            consecutive_activity_days = $18,
            historical_engagement_score = $19
        WHERE user_id = $1
        "#,
    )
    .bind(&record.user_id)
    .bind(record.points_from_posts)
    .bind(record.points_from_likes)
    .bind(record.points_from_comments)
    .bind(record.points_from_referrals)
    .bind(record.points_from_tipping)
    .bind(record.points_from_crypto)
    .bind(record.one_time_points)
    .bind(&record.one_time_events)
    .bind(record.last_reset_date)
    .bind(&record.daily_posts_timestamps)
    .bind(&record.daily_likes_timestamps)
    .bind(&record.daily_comments_timestamps)
    .bind(&record.daily_referrals_timestamps)
    .bind(&record.daily_tipping_timestamps)
    .bind(&record.daily_crypto_timestamps)
    .bind(record.last_active_date)
    .bind(record.consecutive_activity_days)
    .bind(record.historical_engagement_score)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Read a record without locking. Returns `None` for unknown users.
pub async fn fetch(pool: &PgPool, user_id: &str) -> Result<Option<UserScore>> {
    let record = sqlx::query_as::<_, UserScore>(&format!(
        "SELECT {} FROM user_scores WHERE user_id = $1",
        COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Snapshot every ledger record, for the daily analysis.
pub async fn scan_all(pool: &PgPool) -> Result<Vec<UserScore>> {
    let records = sqlx::query_as::<_, UserScore>(&format!(
        "SELECT {} FROM user_scores ORDER BY user_id",
        COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Write the daily-analysis outputs (streak and historical score) for one user.
pub async fn update_daily_analysis(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    streak: i32,
    historical_score: f64,
) -> Result<()> {
    sqlx::query(
        "UPDATE user_scores \
         SET consecutive_activity_days = $2, historical_engagement_score = $3 \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(streak)
    .bind(historical_score)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
