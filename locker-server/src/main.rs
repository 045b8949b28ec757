use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locker_server::api;
use locker_server::config::Config;
use locker_server::repository;
use locker_server::service::LockService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "locker_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pipeline Locker...");

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        "Loaded configuration: storage={}, allow_overlocking={}, pipelines_case_sensitive={}",
        config.storage.name(),
        config.allow_overlocking,
        config.pipelines_case_sensitive
    );

    let repository = repository::connect(&config.storage, config.key_policy())
        .await
        .context("Failed to connect to storage backend")?;

    let service = Arc::new(LockService::new(repository, config.lock_policy()));

    // Build router with all API endpoints
    let app = api::create_router(service);

    let addr = config.bind_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
