//! Video generation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::avatar::AvatarId;
use crate::failure::FailureDetail;
use crate::voice::Voice;

/// Unique identifier for a generated video record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generation lifecycle status.
///
/// Transitions are forward-only: `pending -> processing -> completed | failed`.
/// Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Record created, external work not yet started
    #[default]
    Pending,
    /// External workflow is running
    Processing,
    /// Video generated and stored successfully
    Completed,
    /// Generation or finalization failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }

    /// Check whether moving to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: VideoStatus) -> bool {
        matches!(
            (self, next),
            (VideoStatus::Pending, VideoStatus::Processing)
                | (VideoStatus::Pending, VideoStatus::Failed)
                | (VideoStatus::Processing, VideoStatus::Completed)
                | (VideoStatus::Processing, VideoStatus::Failed)
        )
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted an illegal (backward or terminal) status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal status transition: {from} -> {to}")]
pub struct StatusTransitionError {
    pub from: VideoStatus,
    pub to: VideoStatus,
}

/// A video generation record as persisted in the record store.
///
/// `video_url` is set if and only if the record is `completed`.
/// `error_message` holds a serialized [`FailureDetail`] when `failed`, or the
/// latest progress diagnostic while `processing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub user_id: String,
    pub avatar_id: AvatarId,
    pub script: String,
    pub voice: Voice,
    #[serde(default)]
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a fresh record in `pending` for a validated request.
    pub fn new_pending(
        user_id: impl Into<String>,
        avatar_id: AvatarId,
        script: impl Into<String>,
        voice: Voice,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id: user_id.into(),
            avatar_id,
            script: script.into(),
            voice,
            status: VideoStatus::Pending,
            video_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new status, enforcing the forward-only state machine.
    pub fn transition(&mut self, next: VideoStatus) -> Result<(), StatusTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(StatusTransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark completed with the playable signed URL, clearing diagnostics.
    pub fn complete(&mut self, video_url: impl Into<String>) -> Result<(), StatusTransitionError> {
        self.transition(VideoStatus::Completed)?;
        self.video_url = Some(video_url.into());
        self.error_message = None;
        Ok(())
    }

    /// Mark failed with a structured failure detail.
    pub fn fail(&mut self, detail: &FailureDetail) -> Result<(), StatusTransitionError> {
        self.transition(VideoStatus::Failed)?;
        self.error_message = Some(detail.to_json());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    fn record() -> VideoRecord {
        VideoRecord::new_pending("user-1", AvatarId::from("avatar-1"), "Hello world", Voice::Rachel)
    }

    #[test]
    fn test_new_record_is_pending() {
        let r = record();
        assert_eq!(r.status, VideoStatus::Pending);
        assert!(r.video_url.is_none());
        assert!(r.error_message.is_none());
        assert!(!r.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        let mut r = record();
        r.transition(VideoStatus::Processing).unwrap();
        assert_eq!(r.status, VideoStatus::Processing);
        r.complete("https://signed.example/video.mp4").unwrap();
        assert_eq!(r.status, VideoStatus::Completed);
        assert!(r.video_url.is_some());
        assert!(r.error_message.is_none());
        assert!(r.is_terminal());
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let mut r = record();
        r.transition(VideoStatus::Processing).unwrap();
        r.complete("https://signed.example/video.mp4").unwrap();

        let err = r.transition(VideoStatus::Processing).unwrap_err();
        assert_eq!(err.from, VideoStatus::Completed);
        assert_eq!(err.to, VideoStatus::Processing);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut r = record();
        r.transition(VideoStatus::Processing).unwrap();
        let detail = FailureDetail::new(FailureKind::Upstream, "workflow blew up");
        r.fail(&detail).unwrap();
        assert_eq!(r.status, VideoStatus::Failed);
        assert!(r.error_message.as_deref().unwrap().contains("workflow blew up"));
        assert!(!r.status.can_transition_to(VideoStatus::Processing));
        assert!(!r.status.can_transition_to(VideoStatus::Completed));
    }

    #[test]
    fn test_pending_cannot_skip_to_completed() {
        assert!(!VideoStatus::Pending.can_transition_to(VideoStatus::Completed));
        assert!(VideoStatus::Pending.can_transition_to(VideoStatus::Failed));
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(serde_json::to_string(&VideoStatus::Pending).unwrap(), "\"pending\"");
        let s: VideoStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(s, VideoStatus::Processing);
    }
}
