use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

/// A book record, keyed by `isbn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Primary key; never changes after creation
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// Request model for creating a new book. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBook {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// Request model for updating a book. Absent fields keep their stored value;
/// an explicit `null` is a type error, not "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookUpdate {
    /// `Some` whenever the key appears in the body, even as `null`, so any
    /// attempt to touch the key can be rejected
    #[serde(default, skip_serializing, deserialize_with = "key_present")]
    pub isbn: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "non_null")]
    pub amazon_url: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub pages: Option<i32>,
    #[serde(default, deserialize_with = "non_null")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub year: Option<i32>,
}

fn key_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// One failed field check, rendered into the error `details` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

impl FieldError {
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "field": self.field, "error": self.error })
    }
}

fn check_text(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError {
            field,
            error: "must not be blank",
        });
    }
}

fn check_pages(errors: &mut Vec<FieldError>, pages: i32) {
    if pages <= 0 {
        errors.push(FieldError {
            field: "pages",
            error: "must be positive",
        });
    }
}

impl NewBook {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_text(&mut errors, "isbn", &self.isbn);
        check_text(&mut errors, "amazon_url", &self.amazon_url);
        check_text(&mut errors, "author", &self.author);
        check_text(&mut errors, "language", &self.language);
        check_pages(&mut errors, self.pages);
        check_text(&mut errors, "publisher", &self.publisher);
        check_text(&mut errors, "title", &self.title);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<NewBook> for Book {
    fn from(new: NewBook) -> Self {
        Book {
            isbn: new.isbn,
            amazon_url: new.amazon_url,
            author: new.author,
            language: new.language,
            pages: new.pages,
            publisher: new.publisher,
            title: new.title,
            year: new.year,
        }
    }
}

impl BookUpdate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.isbn.is_some() {
            errors.push(FieldError {
                field: "isbn",
                error: "cannot be changed",
            });
        }
        if self.is_empty() {
            errors.push(FieldError {
                field: "body",
                error: "no fields to update",
            });
        }

        let text_fields = [
            ("amazon_url", &self.amazon_url),
            ("author", &self.author),
            ("language", &self.language),
            ("publisher", &self.publisher),
            ("title", &self.title),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                check_text(&mut errors, field, value);
            }
        }
        if let Some(pages) = self.pages {
            check_pages(&mut errors, pages);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// True when no updatable field is present
    pub fn is_empty(&self) -> bool {
        self.amazon_url.is_none()
            && self.author.is_none()
            && self.language.is_none()
            && self.pages.is_none()
            && self.publisher.is_none()
            && self.title.is_none()
            && self.year.is_none()
    }

    /// Apply present fields onto `book`, leaving `isbn` untouched
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(amazon_url) = &self.amazon_url {
            book.amazon_url = amazon_url.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(language) = &self.language {
            book.language = language.clone();
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
        if let Some(publisher) = &self.publisher {
            book.publisher = publisher.clone();
        }
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(year) = self.year {
            book.year = year;
        }
    }
}

/// `{ "books": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct BookList {
    pub books: Vec<Book>,
}

/// `{ "book": {...} }`
#[derive(Debug, Serialize, Deserialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// `{ "message": "..." }`
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book() -> NewBook {
        NewBook {
            isbn: "1234".to_string(),
            amazon_url: "https://amazon.com/greatbook".to_string(),
            author: "Joey".to_string(),
            language: "English".to_string(),
            pages: 100,
            publisher: "Book Publishers".to_string(),
            title: "My first book".to_string(),
            year: 2000,
        }
    }

    #[test]
    fn complete_new_book_is_valid() {
        assert!(new_book().validate().is_ok());
    }

    #[test]
    fn blank_fields_and_non_positive_pages_are_reported_together() {
        let mut book = new_book();
        book.title = "   ".to_string();
        book.pages = 0;

        let errors = book.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError {
                    field: "pages",
                    error: "must be positive"
                },
                FieldError {
                    field: "title",
                    error: "must not be blank"
                },
            ]
        );
    }

    #[test]
    fn update_rejects_isbn_in_body() {
        let update: BookUpdate =
            serde_json::from_str(r#"{"isbn": "9999", "title": "UPDATED"}"#).unwrap();
        let errors = update.validate().unwrap_err();
        assert_eq!(errors[0].field, "isbn");
    }

    #[test]
    fn empty_update_is_rejected() {
        let update: BookUpdate = serde_json::from_str("{}").unwrap();
        let errors = update.validate().unwrap_err();
        assert_eq!(errors[0].to_json(), json!({"field": "body", "error": "no fields to update"}));
    }

    #[test]
    fn apply_to_only_touches_present_fields() {
        let mut book = Book::from(new_book());
        let update = BookUpdate {
            title: Some("UPDATED".to_string()),
            pages: Some(1000),
            ..BookUpdate::default()
        };
        assert!(update.validate().is_ok());

        update.apply_to(&mut book);
        assert_eq!(book.title, "UPDATED");
        assert_eq!(book.pages, 1000);
        assert_eq!(book.isbn, "1234");
        assert_eq!(book.author, "Joey");
    }

    #[test]
    fn update_rejects_null_isbn() {
        let update: BookUpdate =
            serde_json::from_str(r#"{"isbn": null, "title": "X"}"#).unwrap();
        assert_eq!(update.isbn, Some(serde_json::Value::Null));
        let errors = update.validate().unwrap_err();
        assert_eq!(errors[0].field, "isbn");
    }

    #[test]
    fn update_treats_null_field_as_type_error() {
        let result = serde_json::from_str::<BookUpdate>(r#"{"title": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<BookUpdate>(r#"{"title": "X", "bogus": 1}"#).is_err());

        let mut body = serde_json::to_value(new_book()).unwrap();
        body["bogus"] = json!(1);
        assert!(serde_json::from_value::<NewBook>(body).is_err());
    }

    #[test]
    fn new_book_requires_every_field() {
        let result = serde_json::from_str::<NewBook>(r#"{"isbn": "1", "title": "t"}"#);
        assert!(result.is_err());
    }
}
