//! Pipeline lock endpoints

use crate::LockerClient;
use crate::error::{ClientError, Result};
use locker_core::domain::{Pipeline, PipelineIdentifier};
use locker_core::dto::pipeline::LockRequest;
use reqwest::StatusCode;

impl LockerClient {
    /// Check that the locker is up
    pub async fn health(&self) -> Result<()> {
        let url = self.endpoint(&["health"])?;
        let response = self.client.get(url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Lock a pipeline
    ///
    /// # Returns
    /// The stored lock record. A pipeline locked by someone else fails with
    /// an error for which [`ClientError::is_already_locked`] is true.
    pub async fn lock(&self, req: &LockRequest) -> Result<Pipeline> {
        let url = self.endpoint(&["v1", "pipeline", "lock"])?;
        let response = self.client.post(url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Unlock a pipeline. Unlocking a pipeline that is not locked succeeds.
    pub async fn unlock(&self, identifier: &PipelineIdentifier) -> Result<()> {
        let url = self.endpoint(&["v1", "pipeline", "unlock"])?;
        let response = self.client.put(url).json(identifier).send().await?;

        self.handle_empty_response(response).await
    }

    /// Whether the pipeline may be deployed, i.e. nobody holds its lock
    pub async fn is_deploy_allowed(&self, identifier: &PipelineIdentifier) -> Result<bool> {
        if identifier.project.is_empty() || identifier.environment.is_empty() {
            // An empty path segment would not reach the status route
            return Err(ClientError::InvalidRequest(
                "project and environment are required".to_string(),
            ));
        }

        let url = self.endpoint(&[
            "v1",
            "pipeline",
            "status",
            "project",
            &identifier.project,
            "environment",
            &identifier.environment,
        ])?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::LOCKED => Ok(false),
            _ => Err(Self::api_error(response).await),
        }
    }

    /// List every locked pipeline
    pub async fn locked_pipelines(&self) -> Result<Vec<Pipeline>> {
        let url = self.endpoint(&["v1", "pipelines", "locked"])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }
}
