//! Post API endpoints
//!
//! Every route here requires a token.
//!
//! - GET|POST /api/posts/ - The caller's posts / create a post
//! - GET /api/posts/feed/ - Posts by users the caller follows
//! - GET|PUT|PATCH|DELETE /api/posts/{id}/
//! - GET|POST /api/posts/{id}/comments/
//! - GET|PUT|PATCH|DELETE /api/posts/{id}/comments/{comment_id}/
//! - POST /api/posts/{id}/like/ and /api/posts/{id}/unlike/

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::common::{ListQuery, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{
    CommentResponse, LikeResponse, MessageResponse, Paginated, PostResponse,
};
use crate::models::{CommentInput, PostInput, PostQuery, UpdatePostInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts/", get(list_posts).post(create_post))
        .route("/api/posts/feed/", get(feed))
        .route(
            "/api/posts/{id}/",
            get(get_post)
                .put(replace_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .route(
            "/api/posts/{id}/comments/",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/posts/{id}/comments/{comment_id}/",
            get(get_comment)
                .put(update_comment)
                .patch(update_comment)
                .delete(delete_comment),
        )
        .route("/api/posts/{id}/like/", post(like_post))
        .route("/api/posts/{id}/unlike/", post(unlike_post))
}

// ============================================================================
// Posts
// ============================================================================

async fn list_posts(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<PostResponse>>, ApiError> {
    let query = PostQuery::from(query);
    let page = state.posts.list_own(&user, &query).await?;
    Ok(Json(Paginated::from_page(page)))
}

async fn feed(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<PostResponse>>, ApiError> {
    let page = state.posts.feed(&user, &query.into()).await?;
    Ok(Json(Paginated::from_page(page)))
}

async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<PostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

async fn get_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.posts.get_owned(&user, id).await?;
    Ok(Json(post.into()))
}

/// PUT requires every field
async fn replace_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<PostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.posts.update(&user, id, body.into()).await?;
    Ok(Json(post.into()))
}

async fn update_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.posts.update(&user, id, body).await?;
    Ok(Json(post.into()))
}

async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comments
// ============================================================================

async fn list_comments(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<CommentResponse>>, ApiError> {
    let query = PostQuery::from(query);
    let page = state.posts.list_comments(id, &query).await?;
    Ok(Json(Paginated::from_page(page)))
}

async fn create_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<CommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.posts.create_comment(&user, id, body).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

async fn get_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = state.posts.get_owned_comment(&user, id, comment_id).await?;
    Ok(Json(comment.into()))
}

async fn update_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<CommentInput>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = state
        .posts
        .update_comment(&user, id, comment_id, body)
        .await?;
    Ok(Json(comment.into()))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, comment_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete_comment(&user, id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Likes
// ============================================================================

async fn like_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state.posts.like(&user, id).await?;
    Ok((StatusCode::CREATED, Json(LikeResponse::from(like))))
}

async fn unlike_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.posts.unlike(&user, id).await?;
    Ok(Json(MessageResponse::new("Post unliked")))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{auth, register_user, test_server};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn create_post(server: &TestServer, token: &str, title: &str) -> i64 {
        let (name, value) = auth(token);
        let response = server
            .post("/api/posts/")
            .add_header(name, value)
            .json(&json!({"title": title, "content": format!("About {}", title)}))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_posts_require_authentication() {
        let server = test_server().await;

        let response = server.get("/api/posts/").await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        let response = server
            .post("/api/posts/")
            .json(&json!({"title": "Hi", "content": "There"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_and_list_own_posts() {
        let server = test_server().await;
        let (_, alice) = register_user(&server, "alice").await;
        let (_, bob) = register_user(&server, "bob").await;

        create_post(&server, &alice, "First").await;
        create_post(&server, &alice, "Second").await;
        create_post(&server, &bob, "Elsewhere").await;

        let (name, value) = auth(&alice);
        let page: Value = server
            .get("/api/posts/")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(page["count"], 2);
        assert_eq!(page["page"], 1);
        assert_eq!(page["page_size"], 10);
        assert_eq!(page["results"][0]["title"], "Second");
        assert_eq!(page["results"][0]["author"], "alice");

        let (name, value) = auth(&alice);
        let searched: Value = server
            .get("/api/posts/")
            .add_query_param("search", "first")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(searched["count"], 1);
        assert_eq!(searched["results"][0]["title"], "First");

        let (name, value) = auth(&alice);
        let oldest_first: Value = server
            .get("/api/posts/")
            .add_query_param("ordering", "created_at")
            .add_query_param("page_size", 1)
            .add_header(name, value)
            .await
            .json();
        assert_eq!(oldest_first["total_pages"], 2);
        assert_eq!(oldest_first["results"][0]["title"], "First");
    }

    #[tokio::test]
    async fn test_blank_post_rejected() {
        let server = test_server().await;
        let (_, alice) = register_user(&server, "alice").await;

        let (name, value) = auth(&alice);
        let response = server
            .post("/api/posts/")
            .add_header(name, value)
            .json(&json!({"title": "  ", "content": "Body"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_only_author_can_change_post() {
        let server = test_server().await;
        let (_, alice) = register_user(&server, "alice").await;
        let (_, bob) = register_user(&server, "bob").await;
        let post_id = create_post(&server, &alice, "Mine").await;
        let path = format!("/api/posts/{}/", post_id);

        let (name, value) = auth(&bob);
        let read = server.get(&path).add_header(name, value).await;
        assert_eq!(read.status_code(), StatusCode::FORBIDDEN);

        let (name, value) = auth(&alice);
        let own = server.get(&path).add_header(name, value).await;
        assert_eq!(own.status_code(), StatusCode::OK);
        assert_eq!(own.json::<Value>()["title"], "Mine");

        let (name, value) = auth(&bob);
        let patch = server
            .patch(&path)
            .add_header(name, value)
            .json(&json!({"title": "Stolen"}))
            .await;
        assert_eq!(patch.status_code(), StatusCode::FORBIDDEN);

        let (name, value) = auth(&bob);
        let delete = server.delete(&path).add_header(name, value).await;
        assert_eq!(delete.status_code(), StatusCode::FORBIDDEN);

        let (name, value) = auth(&alice);
        let put = server
            .put(&path)
            .add_header(name, value)
            .json(&json!({"title": "Renamed", "content": "New body"}))
            .await;
        assert_eq!(put.status_code(), StatusCode::OK);
        assert_eq!(put.json::<Value>()["title"], "Renamed");

        let (name, value) = auth(&alice);
        let delete = server.delete(&path).add_header(name, value).await;
        assert_eq!(delete.status_code(), StatusCode::NO_CONTENT);

        let (name, value) = auth(&alice);
        let gone = server.get(&path).add_header(name, value).await;
        assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feed_shows_followed_authors_only() {
        let server = test_server().await;
        let (_, alice) = register_user(&server, "alice").await;
        let (bob_id, bob) = register_user(&server, "bob").await;
        let (_, carol) = register_user(&server, "carol").await;

        create_post(&server, &bob, "From bob").await;
        create_post(&server, &carol, "From carol").await;

        let (name, value) = auth(&alice);
        server
            .post(&format!("/api/accounts/follow/{}/", bob_id))
            .add_header(name, value)
            .await;

        let (name, value) = auth(&alice);
        let feed: Value = server
            .get("/api/posts/feed/")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(feed["count"], 1);
        assert_eq!(feed["results"][0]["title"], "From bob");
    }

    #[tokio::test]
    async fn test_comments_belong_to_their_post() {
        let server = test_server().await;
        let (_, alice) = register_user(&server, "alice").await;
        let (_, bob) = register_user(&server, "bob").await;
        let first = create_post(&server, &alice, "First").await;
        let second = create_post(&server, &alice, "Second").await;

        let (name, value) = auth(&bob);
        let created = server
            .post(&format!("/api/posts/{}/comments/", first))
            .add_header(name, value)
            .json(&json!({"content": "Nice"}))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let comment: Value = created.json();
        assert_eq!(comment["post"], first);
        assert_eq!(comment["author"], "bob");
        let comment_id = comment["id"].as_i64().unwrap();

        let (name, value) = auth(&alice);
        let wrong_post = server
            .get(&format!("/api/posts/{}/comments/{}/", second, comment_id))
            .add_header(name, value)
            .await;
        assert_eq!(wrong_post.status_code(), StatusCode::NOT_FOUND);

        let (name, value) = auth(&alice);
        let not_author = server
            .get(&format!("/api/posts/{}/comments/{}/", first, comment_id))
            .add_header(name, value)
            .await;
        assert_eq!(not_author.status_code(), StatusCode::FORBIDDEN);

        let (name, value) = auth(&bob);
        let own = server
            .get(&format!("/api/posts/{}/comments/{}/", first, comment_id))
            .add_header(name, value)
            .await;
        assert_eq!(own.status_code(), StatusCode::OK);
        assert_eq!(own.json::<Value>()["content"], "Nice");

        let (name, value) = auth(&alice);
        let not_owner = server
            .put(&format!("/api/posts/{}/comments/{}/", first, comment_id))
            .add_header(name, value)
            .json(&json!({"content": "Edited"}))
            .await;
        assert_eq!(not_owner.status_code(), StatusCode::FORBIDDEN);

        let (name, value) = auth(&alice);
        let listed: Value = server
            .get(&format!("/api/posts/{}/comments/", first))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(listed["count"], 1);

        let (name, value) = auth(&alice);
        let notifications: Value = server
            .get("/api/notifications/")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(notifications[0]["verb"], "commented on your post");
        assert_eq!(notifications[0]["target_id"], first);

        let (name, value) = auth(&bob);
        let deleted = server
            .delete(&format!("/api/posts/{}/comments/{}/", first, comment_id))
            .add_header(name, value)
            .await;
        assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_like_and_unlike() {
        let server = test_server().await;
        let (alice_id, alice) = register_user(&server, "alice").await;
        let (bob_id, bob) = register_user(&server, "bob").await;
        let post_id = create_post(&server, &alice, "Likeable").await;
        let like_path = format!("/api/posts/{}/like/", post_id);
        let unlike_path = format!("/api/posts/{}/unlike/", post_id);

        let (name, value) = auth(&bob);
        let liked = server.post(&like_path).add_header(name, value).await;
        assert_eq!(liked.status_code(), StatusCode::CREATED);
        let like: Value = liked.json();
        assert_eq!(like["post"], post_id);
        assert_eq!(like["user"], bob_id);

        let (name, value) = auth(&bob);
        let again = server.post(&like_path).add_header(name, value).await;
        assert_eq!(again.status_code(), StatusCode::BAD_REQUEST);

        let (name, value) = auth(&alice);
        let post: Value = server
            .get(&format!("/api/posts/{}/", post_id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(post["like_count"], 1);
        assert_eq!(post["author_id"], alice_id);

        let (name, value) = auth(&alice);
        let notifications: Value = server
            .get("/api/notifications/")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(notifications.as_array().unwrap().len(), 1);
        assert_eq!(notifications[0]["verb"], "liked your post");

        let (name, value) = auth(&bob);
        let unliked = server.post(&unlike_path).add_header(name, value).await;
        assert_eq!(unliked.status_code(), StatusCode::OK);
        assert_eq!(unliked.json::<Value>()["message"], "Post unliked");

        let (name, value) = auth(&bob);
        let twice = server.post(&unlike_path).add_header(name, value).await;
        assert_eq!(twice.status_code(), StatusCode::BAD_REQUEST);

        let (name, value) = auth(&bob);
        let missing = server
            .post("/api/posts/999/like/")
            .add_header(name, value)
            .await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
