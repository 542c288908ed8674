//! Notification API endpoints
//!
//! - GET /api/notifications/ - All of the caller's notifications, unread first
//! - GET /api/notifications/unread/
//! - POST /api/notifications/{id}/read/
//! - POST /api/notifications/read-all/
//! - DELETE /api/notifications/{id}/delete/

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use std::collections::HashMap;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{MessageResponse, NotificationResponse, UserSummary};
use crate::models::Notification;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/", get(list_notifications))
        .route("/api/notifications/unread/", get(list_unread))
        .route("/api/notifications/read-all/", post(mark_all_read))
        .route("/api/notifications/{id}/read/", post(mark_read))
        .route("/api/notifications/{id}/delete/", delete(delete_notification))
}

/// Attach each notification's actor, looking every distinct actor up once
async fn with_actors(
    state: &AppState,
    notifications: Vec<Notification>,
) -> Result<Vec<NotificationResponse>, ApiError> {
    let mut actors: HashMap<i64, UserSummary> = HashMap::new();
    let mut responses = Vec::with_capacity(notifications.len());

    for notification in notifications {
        let actor = match actors.get(&notification.actor_id) {
            Some(actor) => actor.clone(),
            None => {
                let user = state.accounts.get_user(notification.actor_id).await?;
                let summary = UserSummary::from(user);
                actors.insert(notification.actor_id, summary.clone());
                summary
            }
        };
        responses.push(NotificationResponse::new(notification, actor));
    }

    Ok(responses)
}

async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = state.notifications.list(user.id).await?;
    Ok(Json(with_actors(&state, notifications).await?))
}

async fn list_unread(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = state.notifications.unread(user.id).await?;
    Ok(Json(with_actors(&state, notifications).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.notifications.mark_read(id, user.id).await?;
    Ok(Json(MessageResponse::new("Notification marked as read.")))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let count = state.notifications.mark_all_read(user.id).await?;
    Ok(Json(MessageResponse::new(format!(
        "{} notifications marked as read.",
        count
    ))))
}

async fn delete_notification(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.notifications.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{auth, register_user, test_server};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    async fn follow(server: &TestServer, token: &str, user_id: i64) {
        let (name, value) = auth(token);
        let response = server
            .post(&format!("/api/accounts/follow/{}/", user_id))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    async fn notifications(server: &TestServer, token: &str, path: &str) -> Value {
        let (name, value) = auth(token);
        server.get(path).add_header(name, value).await.json()
    }

    #[tokio::test]
    async fn test_read_and_read_all() {
        let server = test_server().await;
        let (alice_id, alice) = register_user(&server, "alice").await;
        let (_, bob) = register_user(&server, "bob").await;
        let (_, carol) = register_user(&server, "carol").await;

        follow(&server, &bob, alice_id).await;
        follow(&server, &carol, alice_id).await;

        let all = notifications(&server, &alice, "/api/notifications/").await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        assert_eq!(all[0]["actor"]["username"], "carol");
        assert_eq!(all[0]["target_type"], "user");
        let oldest = all[1]["id"].as_i64().unwrap();

        let (name, value) = auth(&alice);
        let read = server
            .post(&format!("/api/notifications/{}/read/", oldest))
            .add_header(name, value)
            .await;
        assert_eq!(read.status_code(), StatusCode::OK);
        assert_eq!(read.json::<Value>()["message"], "Notification marked as read.");

        let unread = notifications(&server, &alice, "/api/notifications/unread/").await;
        assert_eq!(unread.as_array().unwrap().len(), 1);
        assert_eq!(unread[0]["actor"]["username"], "carol");

        let all = notifications(&server, &alice, "/api/notifications/").await;
        assert_eq!(all[0]["is_read"], false);
        assert_eq!(all[1]["is_read"], true);

        let (name, value) = auth(&alice);
        let read_all: Value = server
            .post("/api/notifications/read-all/")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(read_all["message"], "1 notifications marked as read.");

        let unread = notifications(&server, &alice, "/api/notifications/unread/").await;
        assert!(unread.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_notifications_are_hidden() {
        let server = test_server().await;
        let (alice_id, alice) = register_user(&server, "alice").await;
        let (_, bob) = register_user(&server, "bob").await;

        follow(&server, &bob, alice_id).await;
        let all = notifications(&server, &alice, "/api/notifications/").await;
        let id = all[0]["id"].as_i64().unwrap();

        let (name, value) = auth(&bob);
        let read = server
            .post(&format!("/api/notifications/{}/read/", id))
            .add_header(name, value)
            .await;
        assert_eq!(read.status_code(), StatusCode::NOT_FOUND);

        let (name, value) = auth(&bob);
        let delete = server
            .delete(&format!("/api/notifications/{}/delete/", id))
            .add_header(name, value)
            .await;
        assert_eq!(delete.status_code(), StatusCode::NOT_FOUND);

        let (name, value) = auth(&alice);
        let delete = server
            .delete(&format!("/api/notifications/{}/delete/", id))
            .add_header(name, value)
            .await;
        assert_eq!(delete.status_code(), StatusCode::NO_CONTENT);

        let all = notifications(&server, &alice, "/api/notifications/").await;
        assert!(all.as_array().unwrap().is_empty());
    }
}
