//! Workflow stream event and result types.
//!
//! The external workflow emits a sequence of typed events over its stream:
//! zero-or-more `progress` events, optionally one terminal `error` event,
//! then a final result. The final result may carry the video descriptor at
//! the top level or nested under `output`, and may itself carry error fields
//! even when no explicit `error` event was seen.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single event from the workflow stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// Intermediate progress report; payload shape varies by workflow node.
    Progress {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(flatten)]
        extra: Value,
    },
    /// Terminal error emitted mid-stream.
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Descriptor for a generated video file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAsset {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// Nested result payload under the `output` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoAsset>,
}

/// Terminal result of a workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Top-level video descriptor (first known shape)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoAsset>,
    /// Nested video descriptor (second known shape)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<WorkflowOutput>,
    /// Error text if the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Result type marker; `"error"` flags a failed run
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// The terminal result carried no video in any recognized shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized workflow result shape (available keys: {available_keys})")]
pub struct ResultShapeError {
    pub available_keys: String,
}

impl WorkflowResult {
    /// Whether this result reports a failure even without an error event.
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.result_type.as_deref() == Some("error")
    }

    /// Human-readable failure text for an error result.
    pub fn error_text(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Workflow failed".to_string())
    }

    /// Extract the generated video, trying known shapes in priority order.
    ///
    /// The top-level `video` descriptor wins over one nested under `output`.
    /// Fails closed when neither shape is present.
    pub fn extract_video(&self) -> Result<&VideoAsset, ResultShapeError> {
        if let Some(video) = self.video.as_ref().filter(|v| !v.url.is_empty()) {
            return Ok(video);
        }
        if let Some(video) = self
            .output
            .as_ref()
            .and_then(|o| o.video.as_ref())
            .filter(|v| !v.url.is_empty())
        {
            return Ok(video);
        }
        Err(ResultShapeError {
            available_keys: self.available_keys().join(", "),
        })
    }

    fn available_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.video.is_some() {
            keys.push("video");
        }
        if self.output.is_some() {
            keys.push("output");
        }
        if self.error.is_some() {
            keys.push("error");
        }
        if self.result_type.is_some() {
            keys.push("type");
        }
        if self.message.is_some() {
            keys.push("message");
        }
        if self.node_id.is_some() {
            keys.push("node_id");
        }
        keys
    }
}
