//! Catalog service
//!
//! Authors and books. Reads are public. A book remembers who created it
//! and only that user may edit it; any authenticated user may delete.

use crate::db::repositories::{AuthorRepository, BookRepository};
use crate::models::{
    validate_book_title, validate_publication_year, Author, AuthorWithBooks, Book, BookFilter,
    BookInput, UpdateBookInput, User,
};
use anyhow::Context;
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Error types for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Book not found")]
    BookNotFound,

    #[error("Author not found")]
    AuthorNotFound,

    #[error("Only the owner can update this book.")]
    NotOwner,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Catalog service
pub struct CatalogService {
    authors: Arc<dyn AuthorRepository>,
    books: Arc<dyn BookRepository>,
}

impl CatalogService {
    pub fn new(authors: Arc<dyn AuthorRepository>, books: Arc<dyn BookRepository>) -> Self {
        Self { authors, books }
    }

    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, CatalogError> {
        Ok(self.books.list(filter).await.context("Failed to list books")?)
    }

    pub async fn get_book(&self, id: i64) -> Result<Book, CatalogError> {
        self.books
            .get_by_id(id)
            .await
            .context("Failed to get book")?
            .ok_or(CatalogError::BookNotFound)
    }

    pub async fn create_book(&self, user: &User, input: BookInput) -> Result<Book, CatalogError> {
        validate_book_title(&input.title).map_err(CatalogError::Validation)?;
        validate_publication_year(input.publication_year, current_year())
            .map_err(CatalogError::Validation)?;
        self.require_author(input.author_id).await?;

        let book = self
            .books
            .create(&input, Some(user.id))
            .await
            .context("Failed to create book")?;

        tracing::info!(book_id = book.id, created_by = user.id, "Book created");
        Ok(book)
    }

    /// Update a book the caller created; absent fields stay as they are
    pub async fn update_book(
        &self,
        user: &User,
        id: i64,
        input: UpdateBookInput,
    ) -> Result<Book, CatalogError> {
        let mut book = self.get_book(id).await?;
        if book.created_by != Some(user.id) {
            return Err(CatalogError::NotOwner);
        }

        if let Some(title) = input.title {
            validate_book_title(&title).map_err(CatalogError::Validation)?;
            book.title = title;
        }
        if let Some(year) = input.publication_year {
            validate_publication_year(year, current_year()).map_err(CatalogError::Validation)?;
            book.publication_year = year;
        }
        if let Some(author_id) = input.author_id {
            self.require_author(author_id).await?;
            book.author_id = author_id;
        }

        Ok(self.books.update(&book).await.context("Failed to update book")?)
    }

    pub async fn delete_book(&self, id: i64) -> Result<(), CatalogError> {
        if !self.books.delete(id).await.context("Failed to delete book")? {
            return Err(CatalogError::BookNotFound);
        }
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Every author with their books
    pub async fn list_authors(&self) -> Result<Vec<AuthorWithBooks>, CatalogError> {
        let authors = self.authors.list().await.context("Failed to list authors")?;
        let books = self.list_books(&BookFilter::default()).await?;

        let mut by_author: HashMap<i64, Vec<Book>> = HashMap::new();
        for book in books {
            by_author.entry(book.author_id).or_default().push(book);
        }

        Ok(authors
            .into_iter()
            .map(|author| AuthorWithBooks {
                books: by_author.remove(&author.id).unwrap_or_default(),
                author,
            })
            .collect())
    }

    pub async fn get_author(&self, id: i64) -> Result<AuthorWithBooks, CatalogError> {
        let author = self
            .authors
            .get_by_id(id)
            .await
            .context("Failed to get author")?
            .ok_or(CatalogError::AuthorNotFound)?;

        let books = self
            .list_books(&BookFilter {
                author_id: Some(author.id),
                ..Default::default()
            })
            .await?;

        Ok(AuthorWithBooks { author, books })
    }

    pub async fn create_author(&self, name: &str) -> Result<Author, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation("Name cannot be empty".to_string()));
        }
        Ok(self
            .authors
            .create(name)
            .await
            .context("Failed to create author")?)
    }

    /// A book must point at an existing author
    async fn require_author(&self, author_id: i64) -> Result<(), CatalogError> {
        let exists = self
            .authors
            .get_by_id(author_id)
            .await
            .context("Failed to get author")?
            .is_some();
        if !exists {
            return Err(CatalogError::Validation(format!(
                "Invalid pk \"{}\" - author does not exist.",
                author_id
            )));
        }
        Ok(())
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}
