//! PostgreSQL connection pool and schema for the `postgres` storage backend

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // One row per canonical key. An empty locked_by is an unlocked pipeline.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_locks (
            key TEXT PRIMARY KEY,
            project TEXT NOT NULL,
            environment TEXT NOT NULL,
            locked_by TEXT NOT NULL DEFAULT '',
            locked_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pipeline_locks_locked ON pipeline_locks(key) WHERE locked_by <> ''",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
