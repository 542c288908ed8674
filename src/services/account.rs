//! Account service
//!
//! Registration, token login/logout, profiles and the follow graph.
//!
//! Tokens are opaque keys with no expiry: one per user, created on
//! registration or first login and deleted on logout. Following someone
//! notifies them once, in the same transaction that creates the edge.

use crate::db::repositories::{is_unique_violation, TokenRepository, UserRepository};
use crate::models::{
    validate_email, validate_username, AuthToken, NewNotification, NotificationTarget,
    UpdateProfileInput, User, UserProfile,
};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;

pub const FOLLOW_VERB: &str = "started following you";

/// Error types for account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Invalid input or a rule violation such as following yourself
    #[error("{0}")]
    Validation(String),

    /// Username/password pair did not match
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Account service
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user and issue their token
    pub async fn register(&self, input: RegisterInput) -> Result<(User, AuthToken), AccountError> {
        let username = input.username.trim().to_string();
        validate_username(&username).map_err(AccountError::Validation)?;
        validate_email(&input.email).map_err(AccountError::Validation)?;
        if input.password.is_empty() {
            return Err(AccountError::Validation("Password cannot be empty".to_string()));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(username, input.email, password_hash);

        let created = match self.users.create(&user).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => return Err(username_taken()),
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        let token = self
            .tokens
            .get_or_create(created.id)
            .await
            .context("Failed to create token")?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok((created, token))
    }

    /// Check credentials and return the user's token, creating one if needed
    pub async fn login(&self, input: LoginInput) -> Result<(User, AuthToken), AccountError> {
        let user = self
            .users
            .get_by_username(input.username.trim())
            .await
            .context("Failed to look up user")?
            .ok_or(AccountError::InvalidCredentials)?;

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::debug!(user_id = user.id, "Login rejected");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self
            .tokens
            .get_or_create(user.id)
            .await
            .context("Failed to get token")?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, token))
    }

    /// Delete the user's token
    pub async fn logout(&self, user_id: i64) -> Result<(), AccountError> {
        self.tokens
            .delete_for_user(user_id)
            .await
            .context("Failed to delete token")?;
        tracing::info!(user_id, "User logged out");
        Ok(())
    }

    /// Resolve a token key to its user
    pub async fn authenticate(&self, key: &str) -> Result<Option<User>, AccountError> {
        let Some(token) = self
            .tokens
            .get_by_key(key)
            .await
            .context("Failed to look up token")?
        else {
            return Ok(None);
        };

        Ok(self
            .users
            .get_by_id(token.user_id)
            .await
            .context("Failed to load token owner")?)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AccountError> {
        self.users
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(AccountError::UserNotFound)
    }

    /// The user with the usernames on both sides of their follow relation
    pub async fn profile(&self, user: User) -> Result<UserProfile, AccountError> {
        let following = self.following(user.id).await?;
        let followers = self.followers(user.id).await?;

        Ok(UserProfile {
            user,
            following: following.into_iter().map(|u| u.username).collect(),
            followers: followers.into_iter().map(|u| u.username).collect(),
        })
    }

    /// Apply a profile update; absent fields stay as they are
    pub async fn update_profile(
        &self,
        mut user: User,
        input: UpdateProfileInput,
    ) -> Result<User, AccountError> {
        if let Some(username) = input.username {
            let username = username.trim().to_string();
            validate_username(&username).map_err(AccountError::Validation)?;
            user.username = username;
        }
        if let Some(email) = input.email {
            validate_email(&email).map_err(AccountError::Validation)?;
            user.email = email;
        }
        if let Some(bio) = input.bio {
            user.bio = bio;
        }
        if let Some(picture) = input.profile_picture {
            user.profile_picture = Some(picture).filter(|p| !p.is_empty());
        }

        match self.users.update(&user).await {
            Ok(updated) => Ok(updated),
            Err(e) if is_unique_violation(&e) => Err(username_taken()),
            Err(e) => Err(e.context("Failed to update profile").into()),
        }
    }

    /// Follow another user and return the confirmation message
    pub async fn follow(&self, actor: &User, target_id: i64) -> Result<String, AccountError> {
        if actor.id == target_id {
            return Err(AccountError::Validation("You cannot follow yourself".to_string()));
        }
        let target = self.get_user(target_id).await?;

        let notification = NewNotification {
            recipient_id: target.id,
            actor_id: actor.id,
            verb: FOLLOW_VERB.to_string(),
            target: Some(NotificationTarget::user(actor.id)),
        };
        let created = self
            .users
            .add_follow(actor.id, target.id, Some(&notification))
            .await
            .context("Failed to follow user")?;

        if created {
            tracing::info!(follower = actor.id, following = target.id, "User followed");
        }

        Ok(format!("You are now following {}", target.username))
    }

    /// Stop following a user and return the confirmation message
    pub async fn unfollow(&self, actor: &User, target_id: i64) -> Result<String, AccountError> {
        if actor.id == target_id {
            return Err(AccountError::Validation("You cannot unfollow yourself".to_string()));
        }
        let target = self.get_user(target_id).await?;

        let removed = self
            .users
            .remove_follow(actor.id, target.id)
            .await
            .context("Failed to unfollow user")?;
        if !removed {
            return Err(AccountError::Validation(format!(
                "You are not following {}",
                target.username
            )));
        }

        tracing::info!(follower = actor.id, following = target.id, "User unfollowed");
        Ok(format!("You have unfollowed {}", target.username))
    }

    pub async fn followers(&self, user_id: i64) -> Result<Vec<User>, AccountError> {
        Ok(self
            .users
            .followers(user_id)
            .await
            .context("Failed to list followers")?)
    }

    pub async fn following(&self, user_id: i64) -> Result<Vec<User>, AccountError> {
        Ok(self
            .users
            .following(user_id)
            .await
            .context("Failed to list followed users")?)
    }
}

fn username_taken() -> AccountError {
    AccountError::Validation("A user with that username already exists.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::tests::setup_pool;
    use crate::db::repositories::{
        NotificationRepository, SqlxNotificationRepository, SqlxTokenRepository,
        SqlxUserRepository,
    };
    use crate::db::DbPool;

    fn service(pool: &DbPool) -> AccountService {
        AccountService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool.clone()),
        )
    }

    fn register_input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "s3cret-pass".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let pool = setup_pool().await;
        let accounts = service(&pool);

        let (user, token) = accounts.register(register_input("alice")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "s3cret-pass");

        let (logged_in, login_token) = accounts
            .login(LoginInput {
                username: "alice".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(login_token.key, token.key);

        let resolved = accounts.authenticate(&token.key).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let pool = setup_pool().await;
        let accounts = service(&pool);

        let mut bad_name = register_input("alice");
        bad_name.username = "has space".to_string();
        assert!(matches!(
            accounts.register(bad_name).await,
            Err(AccountError::Validation(_))
        ));

        let mut bad_email = register_input("alice");
        bad_email.email = "nope".to_string();
        assert!(matches!(
            accounts.register(bad_email).await,
            Err(AccountError::Validation(_))
        ));

        let mut no_password = register_input("alice");
        no_password.password = String::new();
        assert!(matches!(
            accounts.register(no_password).await,
            Err(AccountError::Validation(_))
        ));

        accounts.register(register_input("alice")).await.unwrap();
        match accounts.register(register_input("alice")).await {
            Err(AccountError::Validation(msg)) => assert!(msg.contains("already exists")),
            other => panic!("expected duplicate username error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let pool = setup_pool().await;
        let accounts = service(&pool);
        accounts.register(register_input("alice")).await.unwrap();

        let wrong_password = LoginInput {
            username: "alice".to_string(),
            password: "wrong".to_string(),
        };
        assert!(matches!(
            accounts.login(wrong_password).await,
            Err(AccountError::InvalidCredentials)
        ));

        let unknown = LoginInput {
            username: "nobody".to_string(),
            password: "s3cret-pass".to_string(),
        };
        assert!(matches!(
            accounts.login(unknown).await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let pool = setup_pool().await;
        let accounts = service(&pool);
        let (user, token) = accounts.register(register_input("alice")).await.unwrap();

        accounts.logout(user.id).await.unwrap();
        assert!(accounts.authenticate(&token.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_follow_notifies_once() {
        let pool = setup_pool().await;
        let accounts = service(&pool);
        let notifications = SqlxNotificationRepository::new(pool.clone());
        let (alice, _) = accounts.register(register_input("alice")).await.unwrap();
        let (bob, _) = accounts.register(register_input("bob")).await.unwrap();

        let message = accounts.follow(&alice, bob.id).await.unwrap();
        assert_eq!(message, "You are now following bob");
        accounts.follow(&alice, bob.id).await.unwrap();

        let received = notifications.list_for_recipient(bob.id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].actor_id, alice.id);
        assert_eq!(received[0].verb, FOLLOW_VERB);
        assert_eq!(received[0].target, Some(NotificationTarget::user(alice.id)));

        assert_eq!(accounts.followers(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_follow_rules() {
        let pool = setup_pool().await;
        let accounts = service(&pool);
        let (alice, _) = accounts.register(register_input("alice")).await.unwrap();
        let (bob, _) = accounts.register(register_input("bob")).await.unwrap();

        assert!(matches!(
            accounts.follow(&alice, alice.id).await,
            Err(AccountError::Validation(_))
        ));
        assert!(matches!(
            accounts.follow(&alice, 999).await,
            Err(AccountError::UserNotFound)
        ));
        match accounts.unfollow(&alice, bob.id).await {
            Err(AccountError::Validation(msg)) => assert_eq!(msg, "You are not following bob"),
            other => panic!("expected not-following error, got {:?}", other),
        }

        accounts.follow(&alice, bob.id).await.unwrap();
        assert_eq!(
            accounts.unfollow(&alice, bob.id).await.unwrap(),
            "You have unfollowed bob"
        );
        assert!(accounts.following(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_and_update() {
        let pool = setup_pool().await;
        let accounts = service(&pool);
        let (alice, _) = accounts.register(register_input("alice")).await.unwrap();
        let (bob, _) = accounts.register(register_input("bob")).await.unwrap();
        accounts.follow(&alice, bob.id).await.unwrap();

        let profile = accounts.profile(alice.clone()).await.unwrap();
        assert_eq!(profile.following, vec!["bob"]);
        assert!(profile.followers.is_empty());

        let updated = accounts
            .update_profile(
                alice.clone(),
                UpdateProfileInput {
                    bio: Some("Hello".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio, "Hello");
        assert_eq!(updated.username, "alice");

        let taken = accounts
            .update_profile(
                updated,
                UpdateProfileInput {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(AccountError::Validation(_))));
    }
}
