//! Notification repository
//!
//! Every read and write except `create` is scoped to the recipient, so a
//! user can never see or change another user's notifications.

use crate::db::DbPool;
use crate::models::{NewNotification, Notification, NotificationTarget, TargetKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use std::sync::Arc;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, actor_id, verb, target_type, target_id, is_read, timestamp";

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a new, unread notification
    async fn create(&self, notification: &NewNotification) -> Result<Notification>;

    /// All notifications of a recipient, unread first, then newest first
    async fn list_for_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>>;

    /// Unread notifications of a recipient, newest first
    async fn list_unread(&self, recipient_id: i64) -> Result<Vec<Notification>>;

    /// Mark one notification read. Returns `false` if it does not belong to the recipient.
    async fn mark_read(&self, id: i64, recipient_id: i64) -> Result<bool>;

    /// Mark every unread notification read, returning how many changed
    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64>;

    /// Delete one notification. Returns `false` if it does not belong to the recipient.
    async fn delete(&self, id: i64, recipient_id: i64) -> Result<bool>;
}

/// SQLx-based notification repository implementation
pub struct SqlxNotificationRepository {
    pool: DbPool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch(&self, sql: &str, recipient_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query(sql)
            .bind(recipient_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list notifications")?;

        rows.iter().map(row_to_notification).collect()
    }
}

/// Insert an unread notification on `conn`, which may be a transaction
pub(crate) async fn insert_notification(
    conn: &mut SqliteConnection,
    notification: &NewNotification,
) -> Result<Notification> {
    let now = Utc::now();
    let target_type = notification.target.map(|t| t.kind.to_string());
    let target_id = notification.target.map(|t| t.id);

    let result = sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, actor_id, verb, target_type, target_id, is_read, timestamp)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(notification.recipient_id)
    .bind(notification.actor_id)
    .bind(&notification.verb)
    .bind(target_type)
    .bind(target_id)
    .bind(now)
    .execute(&mut *conn)
    .await
    .context("Failed to create notification")?;

    Ok(Notification {
        id: result.last_insert_rowid(),
        recipient_id: notification.recipient_id,
        actor_id: notification.actor_id,
        verb: notification.verb.clone(),
        target: notification.target,
        is_read: false,
        timestamp: now,
    })
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<Notification> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        insert_notification(&mut *conn, notification).await
    }

    async fn list_for_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>> {
        self.fetch(
            &format!(
                "SELECT {} FROM notifications WHERE recipient_id = ? ORDER BY is_read ASC, timestamp DESC, id DESC",
                NOTIFICATION_COLUMNS
            ),
            recipient_id,
        )
        .await
    }

    async fn list_unread(&self, recipient_id: i64) -> Result<Vec<Notification>> {
        self.fetch(
            &format!(
                "SELECT {} FROM notifications WHERE recipient_id = ? AND is_read = 0 ORDER BY timestamp DESC, id DESC",
                NOTIFICATION_COLUMNS
            ),
            recipient_id,
        )
        .await
    }

    async fn mark_read(&self, id: i64, recipient_id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
                .bind(id)
                .bind(recipient_id)
                .execute(&self.pool)
                .await
                .context("Failed to mark notification read")?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .context("Failed to mark notifications read")?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64, recipient_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND recipient_id = ?")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete notification")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification> {
    let target_type: Option<String> = row.get("target_type");
    let target_id: Option<i64> = row.get("target_id");

    let target = match (target_type, target_id) {
        (Some(kind), Some(id)) => Some(NotificationTarget {
            kind: TargetKind::from_str(&kind)
                .with_context(|| format!("Invalid target type in database: {}", kind))?,
            id,
        }),
        _ => None,
    };

    Ok(Notification {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        actor_id: row.get("actor_id"),
        verb: row.get("verb"),
        target,
        is_read: row.get("is_read"),
        timestamp: row.get("timestamp"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::tests::{insert_user, setup_pool};

    fn new_notification(recipient_id: i64, actor_id: i64, verb: &str) -> NewNotification {
        NewNotification {
            recipient_id,
            actor_id,
            verb: verb.to_string(),
            target: Some(NotificationTarget::user(actor_id)),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = setup_pool().await;
        let repo = SqlxNotificationRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        let created = repo
            .create(&new_notification(alice.id, bob.id, "started following you"))
            .await
            .unwrap();
        assert!(!created.is_read);

        let list = repo.list_for_recipient(alice.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].target, Some(NotificationTarget::user(bob.id)));
        assert!(repo.list_for_recipient(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_target_is_optional() {
        let pool = setup_pool().await;
        let repo = SqlxNotificationRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        let mut plain = new_notification(alice.id, bob.id, "waved");
        plain.target = None;
        repo.create(&plain).await.unwrap();

        let list = repo.list_for_recipient(alice.id).await.unwrap();
        assert!(list[0].target.is_none());
    }

    #[tokio::test]
    async fn test_unread_first_and_mark_read() {
        let pool = setup_pool().await;
        let repo = SqlxNotificationRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        let first = repo.create(&new_notification(alice.id, bob.id, "one")).await.unwrap();
        repo.create(&new_notification(alice.id, bob.id, "two")).await.unwrap();
        repo.create(&new_notification(alice.id, bob.id, "three")).await.unwrap();

        let list = repo.list_for_recipient(alice.id).await.unwrap();
        assert_eq!(list[0].verb, "three");
        let newest = list[0].id;
        assert!(repo.mark_read(newest, alice.id).await.unwrap());

        // read notifications sort after unread ones regardless of age
        let verbs: Vec<String> = repo
            .list_for_recipient(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.verb)
            .collect();
        assert_eq!(verbs, vec!["two", "one", "three"]);

        let unread = repo.list_unread(alice.id).await.unwrap();
        assert_eq!(unread.len(), 2);
        assert_eq!(unread[0].verb, "two");

        assert!(!repo.mark_read(first.id, bob.id).await.unwrap());
        assert_eq!(repo.mark_all_read(alice.id).await.unwrap(), 2);
        assert_eq!(repo.mark_all_read(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_recipient() {
        let pool = setup_pool().await;
        let repo = SqlxNotificationRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        let n = repo.create(&new_notification(alice.id, bob.id, "hi")).await.unwrap();
        assert!(!repo.delete(n.id, bob.id).await.unwrap());
        assert!(repo.delete(n.id, alice.id).await.unwrap());
        assert!(repo.list_for_recipient(alice.id).await.unwrap().is_empty());
    }
}
