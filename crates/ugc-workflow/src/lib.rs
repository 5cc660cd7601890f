//! Client for the external streaming video-generation workflow.
//!
//! The workflow API accepts a source video plus a narration prompt and
//! streams typed events (`progress`, `error`) while the provider runs speech
//! synthesis and lip-sync compositing. After the stream ends, the terminal
//! result carries the generated video descriptor.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{WorkflowClient, WorkflowConfig};
pub use error::{ClientResult, WorkflowError};
pub use stream::WorkflowStream;
pub use types::{PromptSegment, WorkflowInput};
