//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::AppError;
use serde_json::json;

use super::models::{BookEnvelope, BookList, BookUpdate, FieldError, Message, NewBook};
use super::store::{BookStore, StoreError};

pub type SharedStore = Arc<dyn BookStore>;

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(isbn) => {
                AppError::not_found(format!("no book with isbn '{}'", isbn))
            }
            StoreError::Conflict(isbn) => AppError::conflict(
                vec![json!({ "field": "isbn", "error": "already exists" })],
                format!("a book with isbn '{}' already exists", isbn),
            ),
            StoreError::Database(err) => AppError::Internal(err.into()),
        }
    }
}

fn invalid(errors: Vec<FieldError>) -> AppError {
    AppError::validation(
        errors.iter().map(FieldError::to_json).collect(),
        "book payload failed validation",
    )
}

async fn list_books(State(store): State<SharedStore>) -> Result<Json<BookList>, AppError> {
    let books = store.list().await?;
    Ok(Json(BookList { books }))
}

async fn get_book(
    State(store): State<SharedStore>,
    Path(isbn): Path<String>,
) -> Result<Json<BookEnvelope>, AppError> {
    let book = store.get(&isbn).await?;
    Ok(Json(BookEnvelope { book }))
}

async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<BookEnvelope>), AppError> {
    let Json(new_book) = payload?;
    new_book.validate().map_err(invalid)?;

    let book = store.create(new_book).await?;
    tracing::info!(isbn = %book.isbn, "book created");

    Ok((StatusCode::CREATED, Json(BookEnvelope { book })))
}

async fn update_book(
    State(store): State<SharedStore>,
    Path(isbn): Path<String>,
    payload: Result<Json<BookUpdate>, JsonRejection>,
) -> Result<Json<BookEnvelope>, AppError> {
    let Json(update) = payload?;
    update.validate().map_err(invalid)?;

    let book = store.update(&isbn, update).await?;
    tracing::info!(isbn = %book.isbn, "book updated");

    Ok(Json(BookEnvelope { book }))
}

async fn delete_book(
    State(store): State<SharedStore>,
    Path(isbn): Path<String>,
) -> Result<Json<Message>, AppError> {
    store.delete(&isbn).await?;
    tracing::info!(isbn = %isbn, "book deleted");

    Ok(Json(Message {
        message: "Book deleted".to_string(),
    }))
}
