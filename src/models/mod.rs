//! Data models
//!
//! Database entities (User, AuthToken, Post, Comment, Like, Notification,
//! Author, Book), input types for writes, and the shared list/pagination
//! parameters used by repositories and handlers.

mod book;
mod notification;
mod pagination;
mod post;
mod token;
mod user;

pub use book::{
    validate_book_title, validate_publication_year, Author, AuthorWithBooks, Book, BookFilter,
    BookInput, BookOrderField, UpdateBookInput,
};
pub use notification::{NewNotification, Notification, NotificationTarget, TargetKind};
pub use pagination::{ListParams, OrderBy, PagedResult, SortDirection, DEFAULT_PAGE_SIZE};
pub use post::{
    Comment, CommentInput, CommentOrderField, Like, Post, PostInput, PostOrderField, PostQuery,
    UpdatePostInput,
};
pub use token::AuthToken;
pub use user::{validate_email, validate_username, UpdateProfileInput, User, UserProfile};
