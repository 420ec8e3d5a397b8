//! Data access for the `books` table.

mod memory;
mod postgres;

pub use memory::MemoryBookStore;
pub use postgres::PgBookStore;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookUpdate, NewBook};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no book with isbn '{0}'")]
    NotFound(String),

    #[error("a book with isbn '{0}' already exists")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for books. Every operation touches at most one row and is atomic
/// on its own.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, ordered by title then isbn
    async fn list(&self) -> StoreResult<Vec<Book>>;

    async fn get(&self, isbn: &str) -> StoreResult<Book>;

    /// Fails with `Conflict` when the isbn is taken; never overwrites
    async fn create(&self, book: NewBook) -> StoreResult<Book>;

    /// Overwrite the fields present in `update` and return the stored row
    async fn update(&self, isbn: &str, update: BookUpdate) -> StoreResult<Book>;

    async fn delete(&self, isbn: &str) -> StoreResult<()>;
}
