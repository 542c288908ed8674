//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one entity (or, for users, one
//! entity and its follow edges).

pub mod author;
pub mod book;
pub mod comment;
pub mod like;
pub mod notification;
pub mod post;
pub mod token;
pub mod user;

pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use book::{BookRepository, SqlxBookRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use like::{LikeRepository, SqlxLikeRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use token::{SqlxTokenRepository, TokenRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Whether an error chain bottoms out in a UNIQUE constraint failure
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Build a case-insensitive `LIKE` pattern matching `term` anywhere.
///
/// Only ASCII letters are folded, the same as SQLite's `LOWER()`.
///
/// `%`, `_` and `\` in the term are escaped; queries using the pattern must
/// declare `ESCAPE '\'`.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
