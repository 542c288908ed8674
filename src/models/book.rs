//! Book catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::pagination::OrderBy;

/// Author entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// Author with every book they wrote
#[derive(Debug, Clone)]
pub struct AuthorWithBooks {
    pub author: Author,
    pub books: Vec<Book>,
}

/// Book entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    pub author_id: i64,
    /// User who added the book; only they may edit it
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or fully replacing a book
#[derive(Debug, Clone, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub publication_year: i32,
    #[serde(rename = "author")]
    pub author_id: i64,
}

/// Partial book update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
}

impl From<BookInput> for UpdateBookInput {
    fn from(input: BookInput) -> Self {
        Self {
            title: Some(input.title),
            publication_year: Some(input.publication_year),
            author_id: Some(input.author_id),
        }
    }
}

/// Check that a book title is present
pub fn validate_book_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    Ok(())
}

/// A book cannot be published after the current calendar year
pub fn validate_publication_year(year: i32, current_year: i32) -> Result<(), String> {
    if year > current_year {
        return Err("Publication year cannot be in the future".to_string());
    }
    Ok(())
}

/// Orderable book fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOrderField {
    Id,
    Title,
    PublicationYear,
}

impl BookOrderField {
    pub fn column(&self) -> &'static str {
        match self {
            BookOrderField::Id => "b.id",
            BookOrderField::Title => "b.title",
            BookOrderField::PublicationYear => "b.publication_year",
        }
    }
}

impl FromStr for BookOrderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(BookOrderField::Id),
            "title" => Ok(BookOrderField::Title),
            "publication_year" => Ok(BookOrderField::PublicationYear),
            _ => Err(format!("Cannot order by: {}", s)),
        }
    }
}

/// Exact-match filters, free-text search and ordering for the book list
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author_id: Option<i64>,
    /// Case-insensitive substring over title and author name
    pub search: Option<String>,
    pub ordering: Vec<OrderBy<BookOrderField>>,
}

impl BookFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
