//! API layer - HTTP handlers and routing
//!
//! - Account endpoints (registration, token login, profile, follows)
//! - Post endpoints (posts, comments, likes, feed)
//! - Notification endpoints
//! - Book catalog endpoints
//!
//! Every route is registered under its full path with the trailing slash
//! clients use, so the routers are merged rather than nested.

pub mod accounts;
pub mod books;
pub mod common;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod responses;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(accounts::protected_router())
        .merge(posts::router())
        .merge(notifications::router())
        .merge(books::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .merge(accounts::public_router())
        .merge(books::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let cors = if cors_origin == "*" {
        cors.allow_origin(Any)
    } else {
        match cors_origin.parse::<HeaderValue>() {
            Ok(origin) => cors.allow_origin(origin),
            Err(_) => {
                tracing::warn!(origin = %cors_origin, "Ignoring invalid CORS origin");
                cors
            }
        }
    };

    build_api_router(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
