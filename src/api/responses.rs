//! Shared API response types
//!
//! JSON shapes returned by the handlers, built from the domain models.

use serde::{Deserialize, Serialize};

use crate::models::{
    AuthorWithBooks, Book, Comment, Like, Notification, PagedResult, Post, User, UserProfile,
};

// ============================================================================
// Accounts
// ============================================================================

/// User as returned from register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Public view of a user, used for follower lists and notification actors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub profile_picture: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bio: user.bio,
            profile_picture: user.profile_picture,
        }
    }
}

/// Register/login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// The caller's own account with both sides of the follow relation
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub following_count: usize,
    pub followers_count: usize,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username,
            email: profile.user.email,
            bio: profile.user.bio,
            profile_picture: profile.user.profile_picture,
            following_count: profile.following.len(),
            followers_count: profile.followers.len(),
            following: profile.following,
            followers: profile.followers,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    /// Author's username
    pub author: String,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub like_count: i64,
    pub comment_count: i64,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author: post.author_username,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            like_count: post.like_count,
            comment_count: post.comment_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post: i64,
    /// Author's username
    pub author: String,
    pub author_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post: comment.post_id,
            author: comment.author_username,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: i64,
    pub post: i64,
    pub user: i64,
    pub created_at: String,
}

impl From<Like> for LikeResponse {
    fn from(like: Like) -> Self {
        Self {
            id: like.id,
            post: like.post_id,
            user: like.user_id,
            created_at: like.created_at.to_rfc3339(),
        }
    }
}

/// Page of results
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn from_page<U>(page: PagedResult<U>) -> Self
    where
        T: From<U>,
    {
        let total_pages = page.total_pages();
        Self {
            count: page.total,
            page: page.page,
            page_size: page.per_page,
            total_pages,
            results: page.items.into_iter().map(T::from).collect(),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub actor: UserSummary,
    pub verb: String,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    pub is_read: bool,
    pub timestamp: String,
}

impl NotificationResponse {
    pub fn new(notification: Notification, actor: UserSummary) -> Self {
        Self {
            id: notification.id,
            actor,
            verb: notification.verb,
            target_type: notification.target.map(|t| t.kind.to_string()),
            target_id: notification.target.map(|t| t.id),
            is_read: notification.is_read,
            timestamp: notification.timestamp.to_rfc3339(),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    /// Author id
    pub author: i64,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            publication_year: book.publication_year,
            author: book.author_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub name: String,
    pub books: Vec<BookResponse>,
}

impl From<AuthorWithBooks> for AuthorResponse {
    fn from(entry: AuthorWithBooks) -> Self {
        Self {
            id: entry.author.id,
            name: entry.author.name,
            books: entry.books.into_iter().map(BookResponse::from).collect(),
        }
    }
}
