//! Shared data models for the UGC video backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video generation records and their status state machine
//! - Avatars and the enumerated voice set
//! - Workflow stream events and terminal results
//! - Structured failure diagnostics

pub mod avatar;
pub mod failure;
pub mod video;
pub mod voice;
pub mod workflow;

// Re-export common types
pub use avatar::{Avatar, AvatarId};
pub use failure::{FailureDetail, FailureKind};
pub use video::{StatusTransitionError, VideoId, VideoRecord, VideoStatus};
pub use voice::{Voice, VoiceParseError};
pub use workflow::{ResultShapeError, VideoAsset, WorkflowEvent, WorkflowResult};
