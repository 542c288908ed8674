//! Post, comment and like models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::pagination::{ListParams, OrderBy};

/// Maximum post title length
pub const TITLE_MAX_LEN: usize = 200;

/// Post entity, read together with its author's username and counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

/// Partial post update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<PostInput> for UpdatePostInput {
    fn from(input: PostInput) -> Self {
        Self {
            title: Some(input.title),
            content: Some(input.content),
        }
    }
}

impl PostInput {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

impl UpdatePostInput {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(format!(
            "Title cannot be longer than {} characters",
            TITLE_MAX_LEN
        ));
    }
    Ok(())
}

pub(crate) fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Content cannot be empty".to_string());
    }
    Ok(())
}

/// Orderable post fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrderField {
    CreatedAt,
    UpdatedAt,
}

impl PostOrderField {
    pub fn column(&self) -> &'static str {
        match self {
            PostOrderField::CreatedAt => "created_at",
            PostOrderField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for PostOrderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(PostOrderField::CreatedAt),
            "updated_at" => Ok(PostOrderField::UpdatedAt),
            _ => Err(format!("Cannot order by: {}", s)),
        }
    }
}

impl fmt::Display for PostOrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Comments order by the same timestamp fields as posts
pub type CommentOrderField = PostOrderField;

/// Search, ordering and pagination for post and comment listings
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Case-insensitive substring to search for
    pub search: Option<String>,
    /// Requested ordering terms; empty keeps the listing's default
    pub ordering: Vec<OrderBy<PostOrderField>>,
    pub params: ListParams,
}

impl PostQuery {
    /// The search term, if it is not blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Comment entity, read together with its author's username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

impl CommentInput {
    pub fn validate(&self) -> Result<(), String> {
        validate_content(&self.content)
    }
}

/// Like entity: one per (post, user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
