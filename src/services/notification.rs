//! Notification service
//!
//! Fan-out is a plain insert performed inside the request that triggered it.
//! A user is never notified about their own action.

use crate::db::repositories::NotificationRepository;
use crate::models::{NewNotification, Notification, NotificationTarget};
use anyhow::Context;
use std::sync::Arc;

/// Error types for notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The notification does not exist or belongs to someone else
    #[error("Notification not found.")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Notification service
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// Notify `recipient_id` that `actor_id` did `verb`.
    ///
    /// Returns `None` without writing anything when the actor is the recipient.
    pub async fn notify(
        &self,
        recipient_id: i64,
        actor_id: i64,
        verb: &str,
        target: Option<NotificationTarget>,
    ) -> Result<Option<Notification>, NotificationError> {
        if recipient_id == actor_id {
            tracing::debug!(user_id = actor_id, verb, "Skipping self notification");
            return Ok(None);
        }

        let notification = self
            .repo
            .create(&NewNotification {
                recipient_id,
                actor_id,
                verb: verb.to_string(),
                target,
            })
            .await
            .context("Failed to store notification")?;

        tracing::debug!(
            notification_id = notification.id,
            recipient_id,
            actor_id,
            verb,
            "Notification created"
        );
        Ok(Some(notification))
    }

    /// All of a user's notifications, unread first
    pub async fn list(&self, user_id: i64) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.repo.list_for_recipient(user_id).await?)
    }

    pub async fn unread(&self, user_id: i64) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.repo.list_unread(user_id).await?)
    }

    pub async fn mark_read(&self, id: i64, user_id: i64) -> Result<(), NotificationError> {
        if !self.repo.mark_read(id, user_id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    /// Mark everything read, returning how many notifications changed
    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationError> {
        let count = self.repo.mark_all_read(user_id).await?;
        tracing::debug!(user_id, count, "Marked notifications read");
        Ok(count)
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), NotificationError> {
        if !self.repo.delete(id, user_id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }
}
