//! Record store client for the managed Postgres backend.
//!
//! This crate provides:
//! - A REST client speaking the backend's PostgREST conventions
//! - Typed repositories for video records and avatars, always owner-scoped
//! - Retry with exponential backoff and jitter on idempotent reads

pub mod client;
pub mod error;
pub mod repos;
pub mod retry;

pub use client::{StoreClient, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use repos::{AvatarRepository, VideoPatch, VideoRepository};
pub use retry::RetryConfig;
