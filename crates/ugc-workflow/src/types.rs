//! Workflow input payload types.

use serde::{Deserialize, Serialize};

use ugc_models::Voice;

/// One narration segment of the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSegment {
    pub text: String,
    pub speaker: String,
    pub voice: String,
}

/// Input payload for a workflow run.
///
/// The provider fetches `video_url` itself and animates it to the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub video_url: String,
    pub prompt: Vec<PromptSegment>,
}

impl WorkflowInput {
    /// Build the single-narrator payload used for avatar generation.
    pub fn narration(video_url: impl Into<String>, script: impl Into<String>, voice: Voice) -> Self {
        Self {
            video_url: video_url.into(),
            prompt: vec![PromptSegment {
                text: script.into(),
                speaker: "narrator".to_string(),
                voice: voice.as_str().to_string(),
            }],
        }
    }
}
