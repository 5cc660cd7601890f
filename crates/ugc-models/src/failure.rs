//! Structured failure diagnostics.
//!
//! Failure details are serialized into the record's `error_message` field so
//! that upstream (workflow) and downstream (finalization) failures remain
//! distinguishable after the fact.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which stage of the pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The external workflow reported or raised an error
    Upstream,
    /// The workflow succeeded but download/upload/signing failed
    Finalization,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Upstream => "upstream",
            FailureKind::Finalization => "finalization",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured failure record persisted on failed generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub message: String,
    /// Raw upstream payload, when the workflow supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<Value>,
    /// Workflow node that reported the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl FailureDetail {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            upstream: None,
            node_id: None,
        }
    }

    pub fn with_upstream(mut self, payload: Value) -> Self {
        self.upstream = Some(payload);
        self
    }

    pub fn with_node_id(mut self, node_id: impl Into<Option<String>>) -> Self {
        self.node_id = node_id.into();
        self
    }

    /// Serialize for storage in the record's diagnostic field.
    ///
    /// Serialization of this shape cannot fail; the fallback keeps the
    /// message even if a pathological upstream payload sneaks in.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"kind":"{}","message":"{}"}}"#, self.kind, self.message)
        })
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.message)
    }
}
