pub mod books;

use std::sync::Arc;

use bookshelf_kernel::ModuleRegistry;

use books::{routes::SharedStore, BooksModule};

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, books: SharedStore) {
    registry.register_custom(Arc::new(BooksModule::new(books)));
}
