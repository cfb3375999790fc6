//! Vector index of accepted posts.
//!
//! Backed by a `posts` table with a pgvector column; nearest-neighbour
//! queries use the cosine distance operator. Each row also carries the
//! points awarded for the post so a later delete can refund exactly.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::common::content_hash;
use crate::kernel::BaseEmbeddingService;

/// A post pending insertion.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub image: Option<Vec<u8>>,
}

/// Closest existing post for a piece of content.
#[derive(Debug, Clone)]
pub struct NearestMatch {
    pub post_id: String,
    /// Cosine distance in [0, 2]; 0 is identical.
    pub distance: f64,
}

/// Result of inserting a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The caller-chosen `post_id` already exists.
    Conflict,
}

/// Award metadata returned when a post is removed.
#[derive(Debug, Clone)]
pub struct PostRefund {
    pub awarded_points: f64,
    pub awarded_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ContentIndex {
    pool: PgPool,
    embeddings: Arc<dyn BaseEmbeddingService>,
}

impl ContentIndex {
    pub fn new(pool: PgPool, embeddings: Arc<dyn BaseEmbeddingService>) -> Self {
        Self { pool, embeddings }
    }

    /// Whether a post with this caller-chosen id already exists.
    pub async fn exists(&self, post_id: &str) -> Result<bool> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1::bigint FROM posts WHERE post_id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Nearest existing post by embedding distance. Returns `None` when the
    /// index is empty. An exact content match short-circuits to distance 0.
    pub async fn nearest(&self, content: &str) -> Result<Option<NearestMatch>> {
        if self.count().await? == 0 {
            debug!("content index is empty; no duplicates possible");
            return Ok(None);
        }

        let embedding = self
            .embeddings
            .generate(content)
            .await
            .context("failed to embed content for similarity query")?;
        let vector = Vector::from(embedding);

        let row: Option<(String, f64, String)> = sqlx::query_as(
            "SELECT post_id, (embedding <=> $1)::float8 AS distance, content_hash \
             FROM posts \
             ORDER BY embedding <=> $1 \
             LIMIT 1",
        )
        .bind(&vector)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(post_id, distance, hash)| {
            // Identical normalized text is a definite duplicate regardless of
            // what the encoder thinks.
            let distance = if hash == content_hash(content) {
                0.0
            } else {
                distance
            };
            debug!(matched = %post_id, distance, "nearest post found");
            NearestMatch { post_id, distance }
        }))
    }

    /// Embed and persist a post. The unique constraint on `post_id` is the
    /// authoritative conflict detector under concurrent redelivery.
    pub async fn insert(&self, post: &NewPost) -> Result<InsertOutcome> {
        let embedding = self
            .embeddings
            .generate(&post.content)
            .await
            .context("failed to embed post content")?;
        let vector = Vector::from(embedding);

        let result = sqlx::query(
            "INSERT INTO posts (post_id, user_id, content, content_hash, image, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (post_id) DO NOTHING",
        )
        .bind(&post.post_id)
        .bind(&post.user_id)
        .bind(&post.content)
        .bind(content_hash(&post.content))
        .bind(&post.image)
        .bind(&vector)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            info!(post_id = %post.post_id, "post_id conflict on insert");
            return Ok(InsertOutcome::Conflict);
        }

        info!(post_id = %post.post_id, user_id = %post.user_id, "post added to content index");
        Ok(InsertOutcome::Inserted)
    }

    /// Record the points awarded for a post after scoring, enabling an exact
    /// refund on delete.
    pub async fn update_awarded(
        &self,
        post_id: &str,
        user_id: &str,
        points: f64,
        awarded_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE posts SET awarded_points = $3, awarded_at = $4 \
             WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(points)
        .bind(awarded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a post owned by `user_id`. Returns the award metadata for the
    /// refund, or `None` when no matching row exists (including an existing
    /// `post_id` owned by a different user).
    pub async fn delete(&self, post_id: &str, user_id: &str) -> Result<Option<PostRefund>> {
        let row: Option<(f64, Option<DateTime<Utc>>)> = sqlx::query_as(
            "DELETE FROM posts WHERE post_id = $1 AND user_id = $2 \
             RETURNING awarded_points, awarded_at",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((awarded_points, awarded_at)) => {
                info!(post_id, user_id, awarded_points, "post deleted from content index");
                Ok(Some(PostRefund {
                    awarded_points,
                    awarded_at,
                }))
            }
            None => {
                info!(post_id, user_id, "post not found for deletion");
                Ok(None)
            }
        }
    }

    /// Number of indexed posts.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
