//! Axum HTTP API server.
//!
//! This crate provides:
//! - The generation orchestrator (validate, record, stream, store, sign)
//! - JWT verification against the managed auth provider
//! - Owner-scoped video listing, retrieval and streaming
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::GenerationService;
pub use state::AppState;
