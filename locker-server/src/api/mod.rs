//! API Module
//!
//! HTTP API layer for the locker.
//! Each submodule handles endpoints for a specific concern.

pub mod dashboard;
pub mod error;
pub mod health;
pub mod pipeline;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::LockService;

/// Shared handler state
pub type AppState = Arc<LockService>;

/// Create the main API router with all endpoints
pub fn create_router(service: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Dashboard
        .route(
            "/",
            get(dashboard::index).post(dashboard::lock_and_redirect),
        )
        // Pipeline endpoints
        .route("/v1/pipeline/lock", post(pipeline::lock))
        .route("/v1/pipeline/unlock", put(pipeline::unlock))
        .route(
            "/v1/pipeline/status/project/{project}/environment/{environment}",
            get(pipeline::get_status),
        )
        .route("/v1/pipelines/locked", get(pipeline::get_locked_pipelines))
        // Add state and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
