//! Account API endpoints
//!
//! - POST /api/accounts/register/ - Create an account and its token
//! - POST /api/accounts/login/ - Exchange credentials for the token
//! - POST /api/accounts/logout/ - Delete the caller's token
//! - GET|PUT|PATCH /api/accounts/profile/ - The caller's profile
//! - GET /api/accounts/users/{id}/ - Public view of any user
//! - POST /api/accounts/follow/{user_id}/ and /unfollow/{user_id}/
//! - GET /api/accounts/followers/ and /following/

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{
    AuthResponse, MessageResponse, ProfileResponse, UserResponse, UserSummary,
};
use crate::models::UpdateProfileInput;
use crate::services::{LoginInput, RegisterInput};

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/accounts/register/", post(register))
        .route("/api/accounts/login/", post(login))
        .route("/api/accounts/users/{id}/", get(get_user))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/api/accounts/logout/", post(logout))
        .route(
            "/api/accounts/profile/",
            get(get_profile).put(update_profile).patch(update_profile),
        )
        .route("/api/accounts/follow/{user_id}/", post(follow))
        .route("/api/accounts/unfollow/{user_id}/", post(unfollow))
        .route("/api/accounts/followers/", get(followers))
        .route("/api/accounts/following/", get(following))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state.accounts.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token: token.key,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = state.accounts.login(body).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token: token.key,
    }))
}

async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.accounts.logout(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.accounts.profile(user).await?;
    Ok(Json(profile.into()))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<UpdateProfileInput>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let updated = state.accounts.update_profile(user, body).await?;
    let profile = state.accounts.profile(updated).await?;
    Ok(Json(profile.into()))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserSummary>, ApiError> {
    let user = state.accounts.get_user(id).await?;
    Ok(Json(user.into()))
}

async fn follow(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.accounts.follow(&user, user_id).await?;
    Ok(Json(MessageResponse::new(message)))
}

async fn unfollow(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.accounts.unfollow(&user, user_id).await?;
    Ok(Json(MessageResponse::new(message)))
}

async fn followers(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.accounts.followers(user.id).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

async fn following(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.accounts.following(user.id).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}
