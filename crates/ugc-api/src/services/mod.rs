//! Business logic services.

pub mod generation;

pub use generation::{GenerateVideoRequest, GenerateVideoResponse, GenerationService};
