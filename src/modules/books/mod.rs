pub mod models;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use routes::SharedStore;

/// Books catalogue: CRUD over the `books` table, mounted at `/books`
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Option<Router> {
        Some(routes::router(self.store.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    isbn       TEXT PRIMARY KEY,
                    amazon_url TEXT NOT NULL,
                    author     TEXT NOT NULL,
                    language   TEXT NOT NULL,
                    pages      INTEGER NOT NULL,
                    publisher  TEXT NOT NULL,
                    title      TEXT NOT NULL,
                    year       INTEGER NOT NULL
                );
                "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema }
        }
    })
}

fn json_body(schema_ref: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": schema_ref }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_envelope = json!({
        "type": "object",
        "properties": { "book": { "$ref": "#/components/schemas/Book" } },
        "required": ["book"]
    });
    let isbn_param = json!([{
        "name": "isbn",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    }]);
    let text = |description: &str| json!({ "type": "string", "description": description });

    json!({
        "paths": {
            "": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("All books ordered by title", json!({
                            "type": "object",
                            "properties": {
                                "books": {
                                    "type": "array",
                                    "items": { "$ref": "#/components/schemas/Book" }
                                }
                            },
                            "required": ["books"]
                        })),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body("#/components/schemas/NewBook"),
                    "responses": {
                        "201": json_response("Created book", book_envelope.clone()),
                        "400": error_response("Invalid payload"),
                        "409": error_response("isbn already exists")
                    }
                }
            },
            "/{isbn}": {
                "parameters": isbn_param,
                "get": {
                    "summary": "Get a book by isbn",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("The book", book_envelope.clone()),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "requestBody": json_body("#/components/schemas/BookUpdate"),
                    "responses": {
                        "200": json_response("Updated book", book_envelope),
                        "400": error_response("Invalid payload or isbn change"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("Deletion confirmation", json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } },
                            "required": ["message"]
                        })),
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "isbn": text("Primary key; immutable"),
                        "amazon_url": text("Store page"),
                        "author": text("Author of the book"),
                        "language": text("Language of the text"),
                        "pages": { "type": "integer", "minimum": 1 },
                        "publisher": text("Publisher"),
                        "title": text("Title of the book"),
                        "year": { "type": "integer" }
                    },
                    "required": ["isbn", "amazon_url", "author", "language", "pages", "publisher", "title", "year"]
                },
                "NewBook": { "$ref": "#/components/schemas/Book" },
                "BookUpdate": {
                    "type": "object",
                    "description": "Any subset of the non-key fields; at least one is required",
                    "properties": {
                        "amazon_url": { "type": "string" },
                        "author": { "type": "string" },
                        "language": { "type": "string" },
                        "pages": { "type": "integer", "minimum": 1 },
                        "publisher": { "type": "string" },
                        "title": { "type": "string" },
                        "year": { "type": "integer" }
                    },
                    "minProperties": 1
                }
            }
        }
    })
}
