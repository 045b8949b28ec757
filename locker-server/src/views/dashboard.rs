//! Dashboard view model

use askama::Template;
use locker_core::domain::{Pipeline, PipelineIdentifier};
use locker_core::dto::pipeline::LockRequest;
use serde::Deserialize;

/// Locked pipeline row for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPipelineRow {
    pub project: String,
    pub environment: String,
    pub locked_by: String,
    pub locked_at: String,
}

impl From<Pipeline> for LockedPipelineRow {
    fn from(pipeline: Pipeline) -> Self {
        let locked_at = pipeline
            .locked_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());

        Self {
            project: pipeline.identifier.project,
            environment: pipeline.identifier.environment,
            locked_by: pipeline.locked_by,
            locked_at,
        }
    }
}

/// Lock form as posted by the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockForm {
    pub project: String,
    pub environment: String,
    pub locked_by: String,
}

impl From<LockForm> for LockRequest {
    fn from(form: LockForm) -> Self {
        LockRequest::new(
            PipelineIdentifier::new(form.project, form.environment),
            form.locked_by,
        )
    }
}

/// Dashboard page: locked pipelines and the lock form
#[derive(Template)]
#[template(path = "index.html")]
pub struct DashboardView {
    pub pipelines: Vec<LockedPipelineRow>,
    pub error: Option<String>,
    pub form: LockForm,
}

impl DashboardView {
    /// Rows are sorted by project, then environment
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        let mut pipelines: Vec<LockedPipelineRow> =
            pipelines.into_iter().map(LockedPipelineRow::from).collect();
        pipelines.sort_by(|a, b| {
            (&a.project, &a.environment).cmp(&(&b.project, &b.environment))
        });

        Self {
            pipelines,
            error: None,
            form: LockForm::default(),
        }
    }

    /// Re-renders a rejected form with its error
    pub fn with_error(mut self, error: impl Into<String>, form: LockForm) -> Self {
        self.error = Some(error.into());
        self.form = form;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pipeline(project: &str, environment: &str) -> Pipeline {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        Pipeline::locked(PipelineIdentifier::new(project, environment), "bob", at)
    }

    #[test]
    fn test_row_formats_timestamp() {
        let row = LockedPipelineRow::from(pipeline("area51", "prod"));
        assert_eq!(row.locked_at, "2024-05-01 12:30:00 UTC");
    }

    #[test]
    fn test_rows_are_sorted() {
        let view = DashboardView::new(vec![
            pipeline("b", "prod"),
            pipeline("a", "test"),
            pipeline("a", "prod"),
        ]);

        let order: Vec<(&str, &str)> = view
            .pipelines
            .iter()
            .map(|r| (r.project.as_str(), r.environment.as_str()))
            .collect();
        assert_eq!(order, vec![("a", "prod"), ("a", "test"), ("b", "prod")]);
    }

    #[test]
    fn test_render_lists_pipelines_and_escapes() {
        let html = DashboardView::new(vec![pipeline("<area51>", "prod")])
            .render()
            .unwrap();

        assert!(html.contains("&lt;area51&gt;"));
        assert!(html.contains("bob"));
        assert!(!html.contains("No locked pipelines"));
    }

    #[test]
    fn test_render_error_keeps_form_input() {
        let form = LockForm {
            project: "area51".to_string(),
            environment: "prod".to_string(),
            locked_by: String::new(),
        };
        let html = DashboardView::new(vec![])
            .with_error("REQUEST_LOCKED_BY_EMPTY", form)
            .render()
            .unwrap();

        assert!(html.contains("REQUEST_LOCKED_BY_EMPTY"));
        assert!(html.contains(r#"value="area51""#));
        assert!(html.contains("No locked pipelines"));
    }
}
