//! Dashboard handlers
//!
//! Server-rendered page listing locked pipelines, with a form to lock one.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};

use crate::api::AppState;
use crate::service::LockError;
use crate::views::{DashboardView, LockForm, render_error, render_template};

/// GET /
pub async fn index(State(service): State<AppState>) -> Response {
    match service.get_locked_pipelines().await {
        Ok(pipelines) => render_template(DashboardView::new(pipelines)),
        Err(e) => {
            tracing::error!("Failed to list locked pipelines: {}", e);
            render_error("Failed to list locked pipelines")
        }
    }
}

/// POST /
/// Locks from the dashboard form. Redirects back on success, re-renders the
/// page with the error and the submitted values otherwise. An unreadable form
/// is reported on the page too.
pub async fn lock_and_redirect(
    State(service): State<AppState>,
    form: Result<Form<LockForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("Rejected dashboard form: {}", rejection);
            return render_with_error(&service, rejection.body_text(), LockForm::default()).await;
        }
    };

    let error = match service.lock(form.clone().into()).await {
        Ok(_) => return Redirect::to("/").into_response(),
        Err(LockError::Storage(e)) => {
            tracing::error!("Failed to lock from dashboard: {}", e);
            "Internal server error".to_string()
        }
        Err(e) => e.to_string(),
    };

    render_with_error(&service, error, form).await
}

async fn render_with_error(service: &AppState, error: String, form: LockForm) -> Response {
    match service.get_locked_pipelines().await {
        Ok(pipelines) => render_template(DashboardView::new(pipelines).with_error(error, form)),
        Err(e) => {
            tracing::error!("Failed to list locked pipelines: {}", e);
            render_error("Failed to list locked pipelines")
        }
    }
}
