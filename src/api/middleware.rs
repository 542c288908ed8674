//! API middleware
//!
//! Contains:
//! - `AppState`, the shared services handed to every handler
//! - `ApiError`, the JSON error body and its status mapping
//! - Token authentication (`require_auth` and the `AuthenticatedUser` extractor)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::repositories::{
    SqlxAuthorRepository, SqlxBookRepository, SqlxCommentRepository, SqlxLikeRepository,
    SqlxNotificationRepository, SqlxPostRepository, SqlxTokenRepository, SqlxUserRepository,
};
use crate::db::DbPool;
use crate::models::User;
use crate::services::{
    AccountError, AccountService, CatalogError, CatalogService, NotificationError,
    NotificationService, PostError, PostService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub notifications: Arc<NotificationService>,
    pub catalog: Arc<CatalogService>,
    /// Keyword accepted before the key in `Authorization`, besides `Bearer`
    pub token_keyword: Arc<str>,
}

impl AppState {
    /// Wire every repository and service onto one pool
    pub fn new(pool: DbPool, auth: &AuthConfig) -> Self {
        let notifications = Arc::new(NotificationService::new(
            SqlxNotificationRepository::boxed(pool.clone()),
        ));

        let accounts = Arc::new(AccountService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool.clone()),
        ));

        let posts = Arc::new(PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            SqlxLikeRepository::boxed(pool.clone()),
            notifications.clone(),
        ));

        let catalog = Arc::new(CatalogService::new(
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxBookRepository::boxed(pool.clone()),
        ));

        Self {
            accounts,
            posts,
            notifications,
            catalog,
            token_keyword: Arc::from(auth.token_keyword.as_str()),
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(ApiError::not_authenticated)
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// No credentials were sent to a protected route
    pub fn not_authenticated() -> Self {
        Self::new(
            "NOT_AUTHENTICATED",
            "Authentication credentials were not provided.",
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Log the cause and return a body that does not reveal it
    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "Internal error while handling request");
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "NOT_AUTHENTICATED" => StatusCode::FORBIDDEN,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => ApiError::validation_error(msg),
            AccountError::InvalidCredentials => ApiError::validation_error(err.to_string()),
            AccountError::UserNotFound => ApiError::not_found(err.to_string()),
            AccountError::Internal(e) => ApiError::internal(e),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Validation(msg) => ApiError::validation_error(msg),
            PostError::PostNotFound | PostError::CommentNotFound => {
                ApiError::not_found(err.to_string())
            }
            PostError::Forbidden(msg) => ApiError::forbidden(msg),
            PostError::Internal(e) => ApiError::internal(e),
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound => ApiError::not_found(err.to_string()),
            NotificationError::Internal(e) => ApiError::internal(e),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => ApiError::validation_error(msg),
            CatalogError::BookNotFound | CatalogError::AuthorNotFound => {
                ApiError::not_found(err.to_string())
            }
            CatalogError::NotOwner => ApiError::forbidden(err.to_string()),
            CatalogError::Internal(e) => ApiError::internal(e),
        }
    }
}

/// Extract the token key from `Authorization: <keyword> <key>`.
///
/// Both the configured keyword and `Bearer` are accepted, compared
/// case-insensitively. Returns `None` when no usable header is present.
pub fn extract_token(headers: &HeaderMap, keyword: &str) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let key = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    if scheme.eq_ignore_ascii_case(keyword) || scheme.eq_ignore_ascii_case("Bearer") {
        Some(key.to_string())
    } else {
        None
    }
}

/// Authentication middleware
///
/// Missing credentials answer 403; a key that matches no token answers 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = extract_token(request.headers(), &state.token_keyword)
        .ok_or_else(ApiError::not_authenticated)?;

    let user = state
        .accounts
        .authenticate(&key)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token."))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
