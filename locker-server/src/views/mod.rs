//! View models for the HTML dashboard
//!
//! View models turn domain records into display-ready values and are
//! rendered by askama templates from `templates/`.

pub mod dashboard;

pub use dashboard::{DashboardView, LockForm, LockedPipelineRow};

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Render a template, logging and answering 500 when rendering fails
pub fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template rendering failed: {}", e);
            render_error("Template rendering error")
        }
    }
}

/// Plain text 500 response
pub fn render_error(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Template)]
    #[template(source = "<p>Test: {{ value }}</p>", ext = "html")]
    struct TestTemplate {
        value: String,
    }

    #[test]
    fn test_render_template_success() {
        let response = render_template(TestTemplate {
            value: "hello".to_string(),
        });
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_render_error_is_internal() {
        assert_eq!(
            render_error("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
