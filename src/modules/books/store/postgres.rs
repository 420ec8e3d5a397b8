use async_trait::async_trait;
use sqlx::PgPool;

use super::{BookStore, StoreError, StoreResult};
use crate::modules::books::models::{Book, BookUpdate, NewBook};

/// `BookStore` over a shared Postgres pool. Values are always bound, never
/// spliced into the statement text.
#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

#[async_trait]
impl BookStore for PgBookStore {
    async fn list(&self) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {COLUMNS} FROM books ORDER BY title, isbn"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn get(&self, isbn: &str) -> StoreResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE isbn = $1"))
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(isbn.to_string()))
    }

    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let result = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        ))
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StoreError::Conflict(book.isbn))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, isbn: &str, update: BookUpdate) -> StoreResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET \
                amazon_url = COALESCE($2, amazon_url), \
                author = COALESCE($3, author), \
                language = COALESCE($4, language), \
                pages = COALESCE($5, pages), \
                publisher = COALESCE($6, publisher), \
                title = COALESCE($7, title), \
                year = COALESCE($8, year) \
             WHERE isbn = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(isbn)
        .bind(update.amazon_url)
        .bind(update.author)
        .bind(update.language)
        .bind(update.pages)
        .bind(update.publisher)
        .bind(update.title)
        .bind(update.year)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(isbn.to_string()))
    }

    async fn delete(&self, isbn: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(isbn.to_string()));
        }
        Ok(())
    }
}
