//! Comment repository
//!
//! Database operations for comments on posts.

use super::contains_pattern;
use super::post::order_clause;
use crate::db::DbPool;
use crate::models::{Comment, PagedResult, PostQuery, SortDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.content,
           c.created_at, c.updated_at
    FROM comments c
    INNER JOIN users u ON u.id = c.author_id
"#;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment on `post_id` authored by `author_id`
    async fn create(&self, post_id: i64, author_id: i64, content: &str) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Persist the content of an existing comment
    async fn update(&self, comment: &Comment) -> Result<Comment>;

    /// Delete a comment. Returns `false` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Comments on a post, oldest first unless `query.ordering` says otherwise.
    /// `query.search` matches comment content.
    async fn list_by_post(&self, post_id: i64, query: &PostQuery) -> Result<PagedResult<Comment>>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DbPool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, post_id: i64, search: Option<&str>) {
    qb.push(" WHERE c.post_id = ").push_bind(post_id);
    if let Some(term) = search {
        qb.push(" AND LOWER(c.content) LIKE ")
            .push_bind(contains_pattern(term))
            .push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, post_id: i64, author_id: i64, content: &str) -> Result<Comment> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Created comment not found")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get comment by ID")?;

        Ok(row.as_ref().map(row_to_comment))
    }

    async fn update(&self, comment: &Comment) -> Result<Comment> {
        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(Utc::now())
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;

        self.get_by_id(comment.id)
            .await?
            .context("Updated comment not found")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_post(&self, post_id: i64, query: &PostQuery) -> Result<PagedResult<Comment>> {
        let search = query.search_term();

        let mut count_qb = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM comments c INNER JOIN users u ON u.id = c.author_id",
        );
        push_filters(&mut count_qb, post_id, search);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;

        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_SELECT);
        push_filters(&mut qb, post_id, search);
        qb.push(order_clause("c", &query.ordering, SortDirection::Asc));
        qb.push(" LIMIT ")
            .push_bind(query.params.limit())
            .push(" OFFSET ")
            .push_bind(query.params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list comments")?;

        Ok(PagedResult::new(
            rows.iter().map(row_to_comment).collect(),
            total,
            &query.params,
        ))
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
