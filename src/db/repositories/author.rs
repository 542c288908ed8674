//! Author repository

use crate::db::DbPool;
use crate::models::Author;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<Author>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;

    /// All authors in id order
    async fn list(&self) -> Result<Vec<Author>>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: DbPool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, name: &str) -> Result<Author> {
        let result = sqlx::query("INSERT INTO authors (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to create author")?;

        Ok(Author {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT id, name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get author by ID")?;

        Ok(row.map(|row| Author {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn list(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query("SELECT id, name FROM authors ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list authors")?;

        Ok(rows
            .iter()
            .map(|row| Author {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::tests::setup_pool;

    #[tokio::test]
    async fn test_author_create_get_list() {
        let pool = setup_pool().await;
        let repo = SqlxAuthorRepository::new(pool);

        let orwell = repo.create("George Orwell").await.unwrap();
        let huxley = repo.create("Aldous Huxley").await.unwrap();

        let found = repo.get_by_id(orwell.id).await.unwrap().unwrap();
        assert_eq!(found.name, "George Orwell");
        assert!(repo.get_by_id(999).await.unwrap().is_none());

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![orwell.id, huxley.id]);
    }
}
