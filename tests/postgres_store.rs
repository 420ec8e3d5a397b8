//! Data access and HTTP tests against a real Postgres. Ignored by default;
//! run with `BOOKSHELF_TEST_DATABASE_URL=... cargo test -- --ignored`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use bookshelf_app::{
    models::{BookUpdate, NewBook},
    modules,
    store::{BookStore, PgBookStore, StoreError},
};
use bookshelf_kernel::{settings::Settings, ModuleRegistry};
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::OnceCell;
use tower::ServiceExt;

const DATABASE_URL_ENV: &str = "BOOKSHELF_TEST_DATABASE_URL";

// Concurrent CREATE TABLE IF NOT EXISTS can still collide in the catalog
static SCHEMA: OnceCell<()> = OnceCell::const_new();

async fn pool() -> PgPool {
    let url = std::env::var(DATABASE_URL_ENV)
        .unwrap_or_else(|_| panic!("{DATABASE_URL_ENV} must be set to run this test"));
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();

    SCHEMA
        .get_or_init(|| async {
            let mut registry = ModuleRegistry::new();
            modules::register_all(&mut registry, Arc::new(PgBookStore::new(pool.clone())));
            bookshelf_db::bootstrap_schema(&pool, &registry.collect_migrations())
                .await
                .unwrap();
        })
        .await;

    pool
}

/// Tests run concurrently on one table, so each uses its own isbn.
fn new_book(isbn: &str) -> NewBook {
    NewBook {
        isbn: isbn.to_string(),
        amazon_url: "https://amazon.com/greatbook".to_string(),
        author: "Joey".to_string(),
        language: "English".to_string(),
        pages: 100,
        publisher: "Book Publishers".to_string(),
        title: "My first book".to_string(),
        year: 2000,
    }
}

async fn cleanup(pool: &PgPool, isbn: &str) {
    sqlx::query("DELETE FROM books WHERE isbn = $1")
        .bind(isbn)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires BOOKSHELF_TEST_DATABASE_URL"]
async fn create_get_and_list() {
    let pool = pool().await;
    let store = PgBookStore::new(pool.clone());
    let isbn = "pg-create-get";
    cleanup(&pool, isbn).await;

    let created = store.create(new_book(isbn)).await.unwrap();
    assert_eq!(store.get(isbn).await.unwrap(), created);
    assert!(store.list().await.unwrap().iter().any(|b| b.isbn == isbn));

    cleanup(&pool, isbn).await;
}

#[tokio::test]
#[ignore = "requires BOOKSHELF_TEST_DATABASE_URL"]
async fn duplicate_create_is_conflict() {
    let pool = pool().await;
    let store = PgBookStore::new(pool.clone());
    let isbn = "pg-duplicate";
    cleanup(&pool, isbn).await;

    store.create(new_book(isbn)).await.unwrap();
    let err = store.create(new_book(isbn)).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    cleanup(&pool, isbn).await;
}

#[tokio::test]
#[ignore = "requires BOOKSHELF_TEST_DATABASE_URL"]
async fn partial_update_uses_stored_values_for_absent_fields() {
    let pool = pool().await;
    let store = PgBookStore::new(pool.clone());
    let isbn = "pg-update";
    cleanup(&pool, isbn).await;
    store.create(new_book(isbn)).await.unwrap();

    let update = BookUpdate {
        title: Some("UPDATED".to_string()),
        ..BookUpdate::default()
    };
    let updated = store.update(isbn, update).await.unwrap();
    assert_eq!(updated.title, "UPDATED");
    assert_eq!(updated.author, "Joey");
    assert_eq!(updated.pages, 100);

    let missing = store.update("pg-missing", BookUpdate::default()).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    cleanup(&pool, isbn).await;
}

#[tokio::test]
#[ignore = "requires BOOKSHELF_TEST_DATABASE_URL"]
async fn hostile_isbn_is_bound_not_interpolated() {
    let pool = pool().await;
    let store = PgBookStore::new(pool.clone());
    let isbn = "x'; DROP TABLE books; --";
    cleanup(&pool, isbn).await;

    store.create(new_book(isbn)).await.unwrap();
    assert_eq!(store.get(isbn).await.unwrap().isbn, isbn);
    store.delete(isbn).await.unwrap();
    assert!(matches!(store.get(isbn).await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete(isbn).await, Err(StoreError::NotFound(_))));
}

async fn send(
    router: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
#[ignore = "requires BOOKSHELF_TEST_DATABASE_URL"]
async fn http_crud_round_trip_over_postgres() {
    let pool = pool().await;
    let isbn = "pg-http";
    cleanup(&pool, isbn).await;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::new(PgBookStore::new(pool.clone())));
    let router = bookshelf_http::build_router(&registry, &Settings::default());

    let payload = serde_json::to_value(new_book(isbn)).unwrap();
    let (status, body) = send(&router, Method::POST, "/books", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"], payload);

    let (status, body) = send(&router, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let uri = format!("/books/{isbn}");
    let (status, body) = send(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["isbn"], isbn);

    let (status, body) = send(&router, Method::PUT, &uri, Some(json!({ "title": "UPDATED" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["title"], "UPDATED");
    assert_eq!(body["book"]["author"], "Joey");

    let (status, body) = send(&router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = send(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
