use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookStore, StoreError, StoreResult};
use crate::modules::books::models::{Book, BookUpdate, NewBook};

/// `BookStore` held in process memory. Used by tests and by tooling that
/// needs the module without a database.
#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<BTreeMap<String, Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self) -> StoreResult<Vec<Book>> {
        let mut books: Vec<Book> = self.books.read().await.values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.isbn.cmp(&b.isbn)));
        Ok(books)
    }

    async fn get(&self, isbn: &str) -> StoreResult<Book> {
        self.books
            .read()
            .await
            .get(isbn)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(isbn.to_string()))
    }

    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let mut books = self.books.write().await;
        if books.contains_key(&book.isbn) {
            return Err(StoreError::Conflict(book.isbn));
        }
        let book = Book::from(book);
        books.insert(book.isbn.clone(), book.clone());
        Ok(book)
    }

    async fn update(&self, isbn: &str, update: BookUpdate) -> StoreResult<Book> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(isbn)
            .ok_or_else(|| StoreError::NotFound(isbn.to_string()))?;
        update.apply_to(book);
        Ok(book.clone())
    }

    async fn delete(&self, isbn: &str) -> StoreResult<()> {
        self.books
            .write()
            .await
            .remove(isbn)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(isbn.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(isbn: &str, title: &str) -> NewBook {
        NewBook {
            isbn: isbn.to_string(),
            amazon_url: "https://amazon.com".to_string(),
            author: "testing".to_string(),
            language: "english".to_string(),
            pages: 1000,
            publisher: "the publisher guys".to_string(),
            title: title.to_string(),
            year: 2000,
        }
    }

    #[tokio::test]
    async fn duplicate_isbn_conflicts_without_overwriting() {
        let store = MemoryBookStore::new();
        store.create(new_book("4321", "first")).await.unwrap();

        let err = store.create(new_book("4321", "second")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(isbn) if isbn == "4321"));
        assert_eq!(store.get("4321").await.unwrap().title, "first");
    }

    #[tokio::test]
    async fn list_is_ordered_by_title() {
        let store = MemoryBookStore::new();
        store.create(new_book("1", "Zebra")).await.unwrap();
        store.create(new_book("2", "Aardvark")).await.unwrap();

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Aardvark", "Zebra"]);
    }

    #[tokio::test]
    async fn missing_isbn_is_not_found_everywhere() {
        let store = MemoryBookStore::new();
        assert!(matches!(store.get("999").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update("999", BookUpdate::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete("999").await, Err(StoreError::NotFound(_))));
    }
}
