//! Postgres connection pool factory and schema bootstrap.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bookshelf_kernel::{settings::DatabaseSettings, Migration, Module};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Open a connection pool and verify the database is reachable.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "bookshelf-db",
        max_connections = settings.max_connections,
        "connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .connect(&settings.url)
        .await
        .with_context(|| "failed to connect to database")
}

/// Run every module's schema statements in the given order.
pub async fn bootstrap_schema(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "bookshelf-db",
            module = %module,
            migration = migration.id,
            "applying schema"
        );
        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| format!("schema '{}' of module '{}' failed", migration.id, module))?;
    }
    Ok(())
}

/// Core module owning the shared pool; closes it on shutdown.
pub struct DbModule {
    pool: PgPool,
}

impl DbModule {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        tracing::info!(target: "bookshelf-db", "database pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_db_module_closes_pool_on_stop() {
        let settings = DatabaseSettings::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.url)
            .unwrap();
        let module = DbModule::new(pool.clone());

        assert_eq!(module.name(), "db");
        assert!(module.routes().is_none());
        module.stop().await.unwrap();
        assert!(pool.is_closed());
    }
}
