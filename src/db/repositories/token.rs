//! Token repository
//!
//! One API token per user. Tokens are created on registration or first
//! login and removed on logout.

use crate::db::DbPool;
use crate::models::AuthToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Return the user's token, creating one if they have none
    async fn get_or_create(&self, user_id: i64) -> Result<AuthToken>;

    /// Look up a token by its key
    async fn get_by_key(&self, key: &str) -> Result<Option<AuthToken>>;

    /// Delete the user's token. Returns `false` if they had none.
    async fn delete_for_user(&self, user_id: i64) -> Result<bool>;
}

/// SQLx-based token repository implementation
pub struct SqlxTokenRepository {
    pool: DbPool,
}

impl SqlxTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn TokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn get_or_create(&self, user_id: i64) -> Result<AuthToken> {
        let candidate = AuthToken::generate(user_id);

        // user_id is UNIQUE, so a concurrent creator wins and we read theirs back
        sqlx::query("INSERT OR IGNORE INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&candidate.key)
            .bind(candidate.user_id)
            .bind(candidate.created_at)
            .execute(&self.pool)
            .await
            .context("Failed to create token")?;

        let row = sqlx::query("SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to read token")?;

        Ok(row_to_token(&row))
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<AuthToken>> {
        let row = sqlx::query("SELECT key, user_id, created_at FROM auth_tokens WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get token")?;

        Ok(row.as_ref().map(row_to_token))
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete token")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_token(row: &sqlx::sqlite::SqliteRow) -> AuthToken {
    AuthToken {
        key: row.get("key"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    }
}
