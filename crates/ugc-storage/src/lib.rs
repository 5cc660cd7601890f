//! Object storage client for generated videos.
//!
//! This crate provides:
//! - Byte upload with a no-overwrite precondition
//! - Presigned URL generation
//! - Ranged download for the streaming proxy path

pub mod client;
pub mod error;

pub use client::{video_key, ObjectPart, StorageClient, StorageConfig, VIDEO_CONTENT_TYPE};
pub use error::{StorageError, StorageResult};
