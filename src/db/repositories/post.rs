//! Post repository
//!
//! Posts are always read joined with their author's username and with
//! like/comment counts computed in the same query.

use super::contains_pattern;
use crate::db::DbPool;
use crate::models::{
    ListParams, OrderBy, PagedResult, Post, PostInput, PostOrderField, PostQuery, SortDirection,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username AS author_username, p.title, p.content,
           p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
"#;

const POST_COUNT: &str =
    "SELECT COUNT(*) FROM posts p INNER JOIN users u ON u.id = p.author_id";

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a post authored by `author_id`
    async fn create(&self, author_id: i64, input: &PostInput) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Persist title and content of an existing post
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post with its comments and likes. Returns `false` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Posts written by one author, searched, ordered and paginated
    async fn list_by_author(&self, author_id: i64, query: &PostQuery) -> Result<PagedResult<Post>>;

    /// Posts written by the users `user_id` follows, newest first
    async fn feed(&self, user_id: i64, params: &ListParams) -> Result<PagedResult<Post>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DbPool,
}

impl SqlxPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Which posts a listing covers
#[derive(Debug, Clone, Copy)]
enum Scope {
    Author(i64),
    FollowedBy(i64),
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, scope: Scope, search: Option<&str>) {
    match scope {
        Scope::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        Scope::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }

    if let Some(term) = search {
        let pattern = contains_pattern(term);
        qb.push(" AND (LOWER(p.title) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(p.content) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(u.username) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// `ORDER BY` for posts or comments.
///
/// Without terms this is `created_at` in the `default` direction. Ties
/// break on id, in the direction of the first term.
pub(crate) fn order_clause(
    alias: &str,
    ordering: &[OrderBy<PostOrderField>],
    default: SortDirection,
) -> String {
    let fallback = [OrderBy {
        field: PostOrderField::CreatedAt,
        direction: default,
    }];
    let terms = if ordering.is_empty() { &fallback[..] } else { ordering };

    let mut parts: Vec<String> = terms
        .iter()
        .map(|o| format!("{}.{} {}", alias, o.field.column(), o.direction.as_sql()))
        .collect();
    parts.push(format!("{}.id {}", alias, terms[0].direction.as_sql()));
    format!(" ORDER BY {}", parts.join(", "))
}

impl SqlxPostRepository {
    async fn list(
        &self,
        scope: Scope,
        search: Option<&str>,
        ordering: &[OrderBy<PostOrderField>],
        params: &ListParams,
    ) -> Result<PagedResult<Post>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new(POST_COUNT);
        push_filters(&mut count_qb, scope, search);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;

        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        push_filters(&mut qb, scope, search);
        qb.push(order_clause("p", ordering, SortDirection::Desc));
        qb.push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        Ok(PagedResult::new(
            rows.iter().map(row_to_post).collect(),
            total,
            params,
        ))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, author_id: i64, input: &PostInput) -> Result<Post> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO posts (author_id, title, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(author_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Created post not found")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by ID")?;

        Ok(row.as_ref().map(row_to_post))
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
            .bind(&post.title)
            .bind(&post.content)
            .bind(Utc::now())
            .bind(post.id)
            .execute(&self.pool)
            .await
            .context("Failed to update post")?;

        self.get_by_id(post.id)
            .await?
            .context("Updated post not found")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_author(&self, author_id: i64, query: &PostQuery) -> Result<PagedResult<Post>> {
        self.list(
            Scope::Author(author_id),
            query.search_term(),
            &query.ordering,
            &query.params,
        )
        .await
    }

    async fn feed(&self, user_id: i64, params: &ListParams) -> Result<PagedResult<Post>> {
        self.list(Scope::FollowedBy(user_id), None, &[], params).await
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        title: row.get("title"),
        content: row.get("content"),
        like_count: row.get("like_count"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
