//! Locker HTTP Client
//!
//! A small, typed HTTP client for the pipeline locker API, used by the CLI
//! and by deployment tooling that wants to check or take a lock.
//!
//! # Example
//!
//! ```no_run
//! use locker_client::LockerClient;
//! use locker_core::domain::PipelineIdentifier;
//! use locker_core::dto::pipeline::LockRequest;
//!
//! # async fn example() -> locker_client::Result<()> {
//! let client = LockerClient::new("http://localhost:8080");
//! let pipeline = PipelineIdentifier::new("area51", "production");
//!
//! if client.is_deploy_allowed(&pipeline).await? {
//!     client.lock(&LockRequest::new(pipeline.clone(), "deploy-bot")).await?;
//!     // ... deploy ...
//!     client.unlock(&pipeline).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
mod pipelines;

// Re-export commonly used types
pub use error::{ClientError, Result};

use locker_core::dto::ErrorBody;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the locker API
#[derive(Debug, Clone)]
pub struct LockerClient {
    /// Base URL of the locker (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl LockerClient {
    /// Create a new locker client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the locker API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new locker client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the locker
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest("Base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response without a body
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }

    /// Error from a failed response, using the `error` field of a JSON body
    /// when there is one.
    async fn api_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);

        tracing::debug!("Locker API error {}: {}", status, message);

        ClientError::api_error(status, message)
    }
}
