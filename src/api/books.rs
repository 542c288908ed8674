//! Book catalog API endpoints
//!
//! Reads are public; creating, updating and deleting need a token.
//! Updating a book is further limited to the user who created it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::BookListQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{AuthorResponse, BookResponse};
use crate::models::{AuthorWithBooks, BookFilter, BookInput, UpdateBookInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/books/", get(list_books))
        .route("/api/books/{id}/", get(get_book))
        .route("/api/author/", get(list_authors))
        .route("/api/author/{id}/", get(get_author))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/api/books/create/", post(create_book))
        .route(
            "/api/books/update/{id}",
            put(replace_book).patch(update_book),
        )
        .route("/api/books/delete/{id}", delete(delete_book))
        .route("/api/author/create/", post(create_author))
}

#[derive(Debug, Deserialize)]
pub struct AuthorInput {
    pub name: String,
}

async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let filter = BookFilter::from(query);
    let books = state.catalog.list_books(&filter).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.catalog.get_book(id).await?;
    Ok(Json(book.into()))
}

async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<BookInput>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state.catalog.create_book(&user, body).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

async fn replace_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<BookInput>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.catalog.update_book(&user, id, body.into()).await?;
    Ok(Json(book.into()))
}

async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBookInput>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.catalog.update_book(&user, id, body).await?;
    Ok(Json(book.into()))
}

async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuthorResponse>>, ApiError> {
    let authors = state.catalog.list_authors().await?;
    Ok(Json(authors.into_iter().map(AuthorResponse::from).collect()))
}

async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorResponse>, ApiError> {
    let author = state.catalog.get_author(id).await?;
    Ok(Json(author.into()))
}

async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Json(body): Json<AuthorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let author = state.catalog.create_author(&body.name).await?;
    let response = AuthorResponse::from(AuthorWithBooks {
        author,
        books: Vec::new(),
    });
    Ok((StatusCode::CREATED, Json(response)))
}
