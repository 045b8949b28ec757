//! Pipeline API Handlers
//!
//! HTTP endpoints for locking, unlocking and deploy checks.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use locker_core::domain::{Pipeline, PipelineIdentifier};
use locker_core::dto::pipeline::LockRequest;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// Body of a 423 status response
pub const PIPELINE_IS_LOCKED: &str = "PIPELINE_IS_LOCKED";

/// POST /v1/pipeline/lock
pub async fn lock(
    State(service): State<AppState>,
    Json(req): Json<LockRequest>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::debug!("Lock requested for {} by {}", req.identifier, req.locked_by);

    let pipeline = service.lock(req).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// PUT /v1/pipeline/unlock
pub async fn unlock(
    State(service): State<AppState>,
    Json(identifier): Json<PipelineIdentifier>,
) -> ApiResult<StatusCode> {
    service.unlock(&identifier).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/pipeline/status/project/{project}/environment/{environment}
/// 200 when the pipeline may be deployed, 423 when it is locked
pub async fn get_status(
    State(service): State<AppState>,
    Path((project, environment)): Path<(String, String)>,
) -> ApiResult<Response> {
    let identifier = PipelineIdentifier::new(project, environment);

    if service.is_deploy_allowed(&identifier).await? {
        Ok((StatusCode::OK, "OK").into_response())
    } else {
        Ok((StatusCode::LOCKED, PIPELINE_IS_LOCKED).into_response())
    }
}

/// GET /v1/pipelines/locked
pub async fn get_locked_pipelines(
    State(service): State<AppState>,
) -> ApiResult<Json<Vec<Pipeline>>> {
    let pipelines = service.get_locked_pipelines().await?;

    Ok(Json(pipelines))
}
