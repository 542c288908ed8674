//! User repository
//!
//! Database operations for users and the follow edges between them.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite

use crate::db::repositories::notification::insert_notification;
use crate::db::DbPool;
use crate::models::{NewNotification, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.bio, u.profile_picture, u.password_hash, u.created_at, u.updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails with a UNIQUE violation when the username is taken.
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Persist username, email, bio and profile picture of an existing user
    async fn update(&self, user: &User) -> Result<User>;

    /// Add the edge `follower -> following` and, only when the edge is new,
    /// store `notification` in the same transaction.
    ///
    /// Returns `false` when the edge already existed; nothing is written then.
    async fn add_follow(
        &self,
        follower_id: i64,
        following_id: i64,
        notification: Option<&NewNotification>,
    ) -> Result<bool>;

    /// Remove the edge `follower -> following`.
    ///
    /// Returns `false` when there was no such edge.
    async fn remove_follow(&self, follower_id: i64, following_id: i64) -> Result<bool>;

    /// Users following the given user, by username
    async fn followers(&self, user_id: i64) -> Result<Vec<User>>;

    /// Users the given user follows, by username
    async fn following(&self, user_id: i64) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, bio, profile_picture, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(&user.profile_picture)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by ID")?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users u WHERE u.username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by username")?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, bio = ?, profile_picture = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(&user.profile_picture)
        .bind(now)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        Ok(User {
            updated_at: now,
            ..user.clone()
        })
    }

    async fn add_follow(
        &self,
        follower_id: i64,
        following_id: i64,
        notification: Option<&NewNotification>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO follows (follower_id, following_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to add follow")?;

        let created = result.rows_affected() > 0;
        if created {
            if let Some(notification) = notification {
                insert_notification(&mut *tx, notification).await?;
            }
        }

        tx.commit().await.context("Failed to commit follow")?;
        Ok(created)
    }

    async fn remove_follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await
                .context("Failed to remove follow")?;

        Ok(result.rows_affected() > 0)
    }

    async fn followers(&self, user_id: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM follows f
            INNER JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = ?
            ORDER BY u.username ASC
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followers")?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn following(&self, user_id: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM follows f
            INNER JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = ?
            ORDER BY u.username ASC
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followed users")?;

        Ok(rows.iter().map(row_to_user).collect())
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        bio: row.get("bio"),
        profile_picture: row.get("profile_picture"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::repositories::{
        is_unique_violation, NotificationRepository, SqlxNotificationRepository,
    };
    use crate::models::NotificationTarget;
    use crate::db::{create_test_pool, migrations};

    pub(crate) async fn setup_pool() -> DbPool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    pub(crate) async fn insert_user(pool: &DbPool, username: &str) -> User {
        SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                username.to_string(),
                format!("{}@example.com", username),
                "hash".to_string(),
            ))
            .await
            .expect("Failed to create user")
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());

        let created = insert_user(&pool, "alice").await;
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.email, "alice@example.com");
        assert_eq!(by_id.bio, "");

        let by_name = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        assert!(repo.get_by_id(999).await.unwrap().is_none());
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        insert_user(&pool, "alice").await;

        let err = repo
            .create(&User::new("alice".to_string(), String::new(), "hash".to_string()))
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_user() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        let mut user = insert_user(&pool, "alice").await;

        user.bio = "Reader of books".to_string();
        user.profile_picture = Some("avatars/alice.png".to_string());
        repo.update(&user).await.unwrap();

        let found = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.bio, "Reader of books");
        assert_eq!(found.profile_picture.as_deref(), Some("avatars/alice.png"));
    }

    #[tokio::test]
    async fn test_follow_edges() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let carol = insert_user(&pool, "carol").await;

        assert!(repo.add_follow(alice.id, bob.id, None).await.unwrap());
        assert!(!repo.add_follow(alice.id, bob.id, None).await.unwrap());
        assert!(repo.add_follow(carol.id, bob.id, None).await.unwrap());
        assert!(repo.following(bob.id).await.unwrap().is_empty());

        let followers: Vec<String> = repo
            .followers(bob.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(followers, vec!["alice", "carol"]);

        let following = repo.following(alice.id).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "bob");

        assert!(repo.remove_follow(alice.id, bob.id).await.unwrap());
        assert!(!repo.remove_follow(alice.id, bob.id).await.unwrap());
        assert!(repo.following(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_follow_is_never_stored() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;

        assert!(!repo.add_follow(alice.id, alice.id, None).await.unwrap());
        assert!(repo.following(alice.id).await.unwrap().is_empty());
    }

    fn follow_notification(recipient_id: i64, actor_id: i64) -> NewNotification {
        NewNotification {
            recipient_id,
            actor_id,
            verb: "started following you".to_string(),
            target: Some(NotificationTarget::user(actor_id)),
        }
    }

    #[tokio::test]
    async fn test_follow_stores_notification_once() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        let notifications = SqlxNotificationRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let notification = follow_notification(bob.id, alice.id);

        assert!(repo.add_follow(alice.id, bob.id, Some(&notification)).await.unwrap());
        assert!(!repo.add_follow(alice.id, bob.id, Some(&notification)).await.unwrap());

        let received = notifications.list_for_recipient(bob.id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].actor_id, alice.id);
    }

    #[tokio::test]
    async fn test_failed_notification_rolls_back_follow() {
        let pool = setup_pool().await;
        let repo = SqlxUserRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        // Recipient 999 does not exist, so the notification insert fails its foreign key.
        let broken = follow_notification(999, alice.id);
        assert!(repo.add_follow(alice.id, bob.id, Some(&broken)).await.is_err());
        assert!(repo.following(alice.id).await.unwrap().is_empty());

        let notification = follow_notification(bob.id, alice.id);
        assert!(repo.add_follow(alice.id, bob.id, Some(&notification)).await.unwrap());
    }
}
