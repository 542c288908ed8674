//! User model
//!
//! A registered account. Follow edges between users live in the `follows`
//! table; `UserProfile` carries a user together with both sides of that
//! relation.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum username length
pub const USERNAME_MAX_LEN: usize = 150;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address, may be empty
    pub email: String,
    /// Free-form biography
    pub bio: String,
    /// Profile picture location
    pub profile_picture: Option<String>,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted user.
    ///
    /// The password must already be hashed with `services::password::hash_password`.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            email,
            bio: String::new(),
            profile_picture: None,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this user authored the given row
    pub fn owns(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}

/// A user together with the usernames on both sides of the follow relation
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    /// Usernames this user follows
    pub following: Vec<String>,
    /// Usernames following this user
    pub followers: Vec<String>,
}

/// Profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// Check a username: non-empty, at most 150 characters, and only letters,
/// digits and `@ . + - _`.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!(
            "Username cannot be longer than {} characters",
            USERNAME_MAX_LEN
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Username may contain only letters, numbers, and @/./+/-/_ characters".to_string(),
        );
    }
    Ok(())
}

/// Check an email address. Empty is allowed; anything else needs an `@`
/// with text on both sides.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Ok(());
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err("Invalid email format".to_string()),
    }
}
