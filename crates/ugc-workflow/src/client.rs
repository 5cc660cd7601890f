//! Workflow service HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{ClientResult, WorkflowError};
use crate::stream::WorkflowStream;
use crate::types::WorkflowInput;

/// Configuration for the workflow client.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Base URL of the workflow API
    pub base_url: String,
    /// API credentials
    pub api_key: String,
    /// Workflow identifier to invoke
    pub workflow_name: String,
    /// Request timeout covering the whole stream
    pub timeout: Duration,
}

impl WorkflowConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var("WORKFLOW_API_KEY")
            .map_err(|_| WorkflowError::RequestFailed("WORKFLOW_API_KEY not set".to_string()))?;

        Ok(Self {
            base_url: std::env::var("WORKFLOW_API_URL")
                .unwrap_or_else(|_| "https://fal.run".to_string()),
            api_key,
            workflow_name: std::env::var("WORKFLOW_NAME")
                .unwrap_or_else(|_| "workflows/onurhan1337/voqua".to_string()),
            // Lip-sync runs take minutes; the stream stays open throughout
            timeout: Duration::from_secs(
                std::env::var("WORKFLOW_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        })
    }
}

/// Client for the external streaming workflow.
pub struct WorkflowClient {
    http: Client,
    config: WorkflowConfig,
}

impl WorkflowClient {
    /// Create a new workflow client.
    pub fn new(config: WorkflowConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ugc-workflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WorkflowError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(WorkflowConfig::from_env()?)
    }

    /// Start a streaming workflow run.
    pub async fn stream(&self, input: &WorkflowInput) -> ClientResult<WorkflowStream> {
        let url = format!(
            "{}/{}/stream",
            self.config.base_url.trim_end_matches('/'),
            self.config.workflow_name
        );

        debug!(workflow = %self.config.workflow_name, "Opening workflow stream");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Key {}", self.config.api_key))
            .header("Accept", "text/event-stream")
            .json(&serde_json::json!({ "input": input }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::StreamFailed(format!(
                "workflow API returned {}: {}",
                status, body
            )));
        }

        Ok(WorkflowStream::new(response.bytes_stream()))
    }
}
