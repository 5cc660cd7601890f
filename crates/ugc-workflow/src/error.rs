//! Workflow client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to open workflow stream: {0}")]
    StreamFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid stream event: {0}")]
    InvalidEvent(String),

    #[error("Stream ended without a terminal result")]
    MissingResult,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
