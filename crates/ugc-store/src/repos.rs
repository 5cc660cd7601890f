//! Typed repositories for video records and avatars.
//!
//! Every video query is scoped to its owner; the pipeline never reads or
//! writes rows across users.

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::info;

use ugc_models::{Avatar, AvatarId, VideoId, VideoRecord, VideoStatus};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

const VIDEOS_TABLE: &str = "generated_videos";
const AVATARS_TABLE: &str = "avatar_previews";

/// Partial update for a video record.
///
/// Builds only the fields being changed; `updated_at` is stamped on apply.
#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
    fields: Map<String, Value>,
}

impl VideoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: VideoStatus) -> Self {
        self.fields.insert("status".into(), json!(status));
        self
    }

    pub fn video_url(mut self, url: impl Into<String>) -> Self {
        self.fields.insert("video_url".into(), json!(url.into()));
        self
    }

    /// Set the diagnostic field; `None` clears it.
    pub fn error_message(mut self, message: Option<String>) -> Self {
        self.fields.insert("error_message".into(), json!(message));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_body(mut self) -> Map<String, Value> {
        self.fields.insert("updated_at".into(), json!(Utc::now()));
        self.fields
    }
}

/// Repository for a single user's video records.
pub struct VideoRepository {
    client: StoreClient,
    user_id: String,
}

impl VideoRepository {
    /// Create a repository scoped to one owner.
    pub fn new(client: StoreClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }

    /// Insert a new record. The record's `user_id` must match this scope.
    pub async fn insert(&self, record: &VideoRecord) -> StoreResult<VideoRecord> {
        if record.user_id != self.user_id {
            return Err(StoreError::PermissionDenied(format!(
                "record owner {} does not match repository scope",
                record.user_id
            )));
        }

        let stored = self.client.insert(VIDEOS_TABLE, record).await?;
        info!(video_id = %record.id, "Created video record");
        Ok(stored)
    }

    /// Apply a partial update to one of this user's records.
    pub async fn update(&self, video_id: &VideoId, patch: VideoPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        self.client
            .update(
                VIDEOS_TABLE,
                &[
                    ("id", video_id.to_string()),
                    ("user_id", self.user_id.clone()),
                ],
                &patch.into_body(),
            )
            .await
    }

    /// Get one of this user's records.
    pub async fn get(&self, video_id: &VideoId) -> StoreResult<Option<VideoRecord>> {
        let mut rows: Vec<VideoRecord> = self
            .client
            .select(
                VIDEOS_TABLE,
                &[
                    ("id", video_id.to_string()),
                    ("user_id", self.user_id.clone()),
                ],
            )
            .await?;
        Ok(rows.pop())
    }

    /// List all of this user's records.
    pub async fn list(&self) -> StoreResult<Vec<VideoRecord>> {
        self.client
            .select(VIDEOS_TABLE, &[("user_id", self.user_id.clone())])
            .await
    }
}

/// Repository for avatars (read-only inputs, not owner-scoped).
pub struct AvatarRepository {
    client: StoreClient,
}

impl AvatarRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Get an avatar by id.
    pub async fn get(&self, avatar_id: &AvatarId) -> StoreResult<Option<Avatar>> {
        let mut rows: Vec<Avatar> = self
            .client
            .select(AVATARS_TABLE, &[("id", avatar_id.to_string())])
            .await?;
        Ok(rows.pop())
    }

    /// List all avatars.
    pub async fn list(&self) -> StoreResult<Vec<Avatar>> {
        self.client.select(AVATARS_TABLE, &[]).await
    }

    /// Count available avatars.
    pub async fn count(&self) -> StoreResult<u64> {
        self.client.count(AVATARS_TABLE, &[]).await
    }
}
