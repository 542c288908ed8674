//! Like repository
//!
//! A user likes a post at most once; the `(post_id, user_id)` pair is unique.

use crate::db::DbPool;
use crate::models::Like;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Like repository trait
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Record that `user_id` likes `post_id`.
    ///
    /// Returns `None` when the like already existed.
    async fn create(&self, post_id: i64, user_id: i64) -> Result<Option<Like>>;

    /// Remove a like. Returns `false` if there was none.
    async fn delete(&self, post_id: i64, user_id: i64) -> Result<bool>;
}

/// SQLx-based like repository implementation
pub struct SqlxLikeRepository {
    pool: DbPool,
}

impl SqlxLikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn LikeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LikeRepository for SqlxLikeRepository {
    async fn create(&self, post_id: i64, user_id: i64) -> Result<Option<Like>> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create like")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(Like {
            id: result.last_insert_rowid(),
            post_id,
            user_id,
            created_at: now,
        }))
    }

    async fn delete(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete like")?;

        Ok(result.rows_affected() > 0)
    }
}
