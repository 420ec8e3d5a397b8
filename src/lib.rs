//! Bookshelf application library
//!
//! Wires the books module onto the kernel, database and HTTP crates.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_db::DbModule;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use modules::books::store::PgBookStore;

/// Re-export commonly used types
pub use modules::books::{models, store, BooksModule};

/// Connect to the database, bootstrap the schema, and serve HTTP until a
/// shutdown signal arrives. Modules are stopped even if the server fails.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = bookshelf_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    registry.register_core(Arc::new(DbModule::new(pool.clone())));
    modules::register_all(&mut registry, Arc::new(PgBookStore::new(pool.clone())));

    bookshelf_db::bootstrap_schema(&pool, &registry.collect_migrations())
        .await
        .context("schema bootstrap failed")?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;
    registry.stop_all().await?;
    served
}
