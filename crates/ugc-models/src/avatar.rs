//! Avatar models.
//!
//! Avatars are read-only inputs to the generation pipeline: a pre-recorded
//! base video used as the animation source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an avatar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarId(pub String);

impl AvatarId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AvatarId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AvatarId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An avatar record as stored in the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    pub id: AvatarId,
    /// Source media used as the base for generated videos
    #[serde(default)]
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Avatar {
    /// Check that the source media URL is present and network-scheme prefixed.
    ///
    /// The workflow provider fetches this URL itself, so anything that is not
    /// plain http(s) is rejected before a record is created.
    pub fn has_playable_source(&self) -> bool {
        let url = self.video_url.trim();
        url.starts_with("http://") || url.starts_with("https://")
    }
}
