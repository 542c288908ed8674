//! Book repository
//!
//! Listing supports exact-match filters, a case-insensitive search over
//! the title and the author's name, and ordering by id, title or
//! publication year. Without an ordering books come back in id order.

use super::contains_pattern;
use crate::db::DbPool;
use crate::models::{Book, BookFilter, BookInput, BookOrderField, OrderBy, SortDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.publication_year, b.author_id, b.created_by, b.created_at
    FROM books b
    INNER JOIN authors a ON a.id = b.author_id
    WHERE 1 = 1
"#;

/// Book repository trait
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Create a book, recording the user who added it
    async fn create(&self, input: &BookInput, created_by: Option<i64>) -> Result<Book>;

    /// Get book by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Persist title, publication year and author of an existing book
    async fn update(&self, book: &Book) -> Result<Book>;

    /// Delete a book. Returns `false` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Books matching a filter
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>>;
}

/// SQLx-based book repository implementation
pub struct SqlxBookRepository {
    pool: DbPool,
}

impl SqlxBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn BookRepository> {
        Arc::new(Self::new(pool))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &BookFilter) {
    if let Some(title) = &filter.title {
        qb.push(" AND b.title = ").push_bind(title.clone());
    }
    if let Some(year) = filter.publication_year {
        qb.push(" AND b.publication_year = ").push_bind(year);
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND b.author_id = ").push_bind(author_id);
    }
    if let Some(term) = filter.search_term() {
        let pattern = contains_pattern(term);
        qb.push(" AND (LOWER(b.title) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(a.name) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// `ORDER BY` for the requested terms; id ascending when there are none.
/// Unless id is already a term, ties break on id in the first term's direction.
fn order_clause(ordering: &[OrderBy<BookOrderField>]) -> String {
    let mut parts: Vec<String> = ordering
        .iter()
        .map(|o| format!("{} {}", o.field.column(), o.direction.as_sql()))
        .collect();
    if !ordering.iter().any(|o| o.field == BookOrderField::Id) {
        let dir = ordering
            .first()
            .map(|o| o.direction)
            .unwrap_or(SortDirection::Asc);
        parts.push(format!("b.id {}", dir.as_sql()));
    }
    format!(" ORDER BY {}", parts.join(", "))
}

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn create(&self, input: &BookInput, created_by: Option<i64>) -> Result<Book> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO books (title, publication_year, author_id, created_by, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(input.publication_year)
        .bind(input.author_id)
        .bind(created_by)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create book")?;

        Ok(Book {
            id: result.last_insert_rowid(),
            title: input.title.clone(),
            publication_year: input.publication_year,
            author_id: input.author_id,
            created_by,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("{} AND b.id = ?", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get book by ID")?;

        Ok(row.as_ref().map(row_to_book))
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        sqlx::query("UPDATE books SET title = ?, publication_year = ?, author_id = ? WHERE id = ?")
            .bind(&book.title)
            .bind(book.publication_year)
            .bind(book.author_id)
            .bind(book.id)
            .execute(&self.pool)
            .await
            .context("Failed to update book")?;

        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete book")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut qb = QueryBuilder::<Sqlite>::new(BOOK_SELECT);
        push_filters(&mut qb, filter);
        qb.push(order_clause(&filter.ordering));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list books")?;

        Ok(rows.iter().map(row_to_book).collect())
    }
}

fn row_to_book(row: &sqlx::sqlite::SqliteRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        publication_year: row.get("publication_year"),
        author_id: row.get("author_id"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    }
}
