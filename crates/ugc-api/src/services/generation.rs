//! The generation orchestrator.
//!
//! Coordinates one request through its whole lifecycle: validate input,
//! create a pending record, stream the external workflow, download the
//! generated asset, upload it to object storage, presign a long-lived URL
//! and finalize the record. A durable, inspectable record exists at every
//! stage; on any failure after creation the record ends `failed` with a
//! structured diagnostic.
//!
//! Deliberately NOT idempotent: every invocation creates a fresh record.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use ugc_models::{
    Avatar, AvatarId, FailureDetail, FailureKind, VideoId, VideoRecord, VideoStatus, Voice,
    WorkflowEvent,
};
use ugc_storage::{video_key, StorageClient, VIDEO_CONTENT_TYPE};
use ugc_store::{AvatarRepository, StoreClient, VideoPatch, VideoRepository};
use ugc_workflow::{WorkflowClient, WorkflowInput};

use crate::auth::AuthUser;
use crate::config::LONG_SIGNED_URL_EXPIRY;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// A video generation request.
///
/// Fields default to empty so an absent key is rejected by the same
/// missing-fields check as an empty value, not by the deserializer.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateVideoRequest {
    #[serde(default)]
    pub avatar_id: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub voice: String,
}

/// Successful generation response.
#[derive(Debug, Serialize)]
pub struct GenerateVideoResponse {
    pub id: VideoId,
    pub status: VideoStatus,
    pub video_url: String,
}

/// Orchestrates the generation pipeline.
#[derive(Clone)]
pub struct GenerationService {
    store: StoreClient,
    storage: Arc<StorageClient>,
    workflow: Arc<WorkflowClient>,
    http: reqwest::Client,
}

impl GenerationService {
    pub fn new(
        store: StoreClient,
        storage: Arc<StorageClient>,
        workflow: Arc<WorkflowClient>,
    ) -> Self {
        Self {
            store,
            storage,
            workflow,
            http: reqwest::Client::new(),
        }
    }

    /// Run one generation request end to end.
    pub async fn generate(
        &self,
        user: &AuthUser,
        request: GenerateVideoRequest,
    ) -> ApiResult<GenerateVideoResponse> {
        info!(
            avatar_id = %request.avatar_id,
            script_len = request.script.len(),
            voice = %request.voice,
            "Video generation request received"
        );

        // Preconditions, in order; each rejects before any record exists
        if request.avatar_id.trim().is_empty()
            || request.script.trim().is_empty()
            || request.voice.trim().is_empty()
        {
            warn!("Missing required fields");
            return Err(ApiError::validation("Missing required fields"));
        }

        let voice: Voice = request
            .voice
            .parse()
            .map_err(|_| {
                warn!(voice = %request.voice, "Invalid voice selected");
                ApiError::validation("Invalid voice")
            })?;

        let avatars = AvatarRepository::new(self.store.clone());
        let avatar = avatars
            .get(&AvatarId::from(request.avatar_id.as_str()))
            .await?
            .ok_or_else(|| {
                warn!(avatar_id = %request.avatar_id, "Avatar not found");
                ApiError::not_found("Avatar not found")
            })?;

        if !avatar.has_playable_source() {
            warn!(avatar_id = %avatar.id, "Avatar has no playable source video");
            return Err(ApiError::validation("Avatar has no playable source video"));
        }

        let videos = VideoRepository::new(self.store.clone(), &user.uid);
        let record = VideoRecord::new_pending(&user.uid, avatar.id.clone(), &request.script, voice);
        let record = videos.insert(&record).await.map_err(|e| {
            error!("Failed to create video record: {}", e);
            ApiError::internal("Failed to create video record")
        })?;

        metrics::record_generation_started();
        info!(video_id = %record.id, "Video record created, starting workflow");

        // External work begins; the record reflects it before the first event
        let outcome = match videos
            .update(&record.id, VideoPatch::new().status(VideoStatus::Processing))
            .await
        {
            Ok(()) => self.run_pipeline(&videos, &record, &avatar).await,
            Err(e) => Err(FailureDetail::new(
                FailureKind::Finalization,
                format!("Failed to update video status: {}", e),
            )),
        };

        // Once a record exists, every failure path ends in `failed`
        match outcome {
            Ok(signed_url) => {
                if let Err(e) = videos
                    .update(
                        &record.id,
                        VideoPatch::new()
                            .status(VideoStatus::Completed)
                            .video_url(&signed_url)
                            .error_message(None),
                    )
                    .await
                {
                    let detail = FailureDetail::new(
                        FailureKind::Finalization,
                        format!("video generated but record update failed: {}", e),
                    );
                    return Err(self.fail_record(&videos, &record.id, detail).await);
                }

                metrics::record_generation_completed();
                info!(video_id = %record.id, "Video generation completed successfully");

                Ok(GenerateVideoResponse {
                    id: record.id,
                    status: VideoStatus::Completed,
                    video_url: signed_url,
                })
            }
            Err(detail) => Err(self.fail_record(&videos, &record.id, detail).await),
        }
    }

    /// Best-effort move of the record to `failed`, returning the API error
    /// to surface. A store failure here is logged, never propagated.
    async fn fail_record(
        &self,
        videos: &VideoRepository,
        video_id: &VideoId,
        detail: FailureDetail,
    ) -> ApiError {
        error!(
            video_id = %video_id,
            kind = %detail.kind,
            "Video generation failed: {}",
            detail.message
        );

        if let Err(e) = videos
            .update(
                video_id,
                VideoPatch::new()
                    .status(VideoStatus::Failed)
                    .error_message(Some(detail.to_json())),
            )
            .await
        {
            error!(video_id = %video_id, "Failed to mark record failed: {}", e);
        }

        metrics::record_generation_failed(detail.kind.as_str());
        ApiError::internal(detail.message)
    }

    /// Stream the workflow and finalize the asset into storage.
    ///
    /// Returns the long-lived signed URL on success. Failures carry enough
    /// structure to tell an upstream workflow error from a finalization one.
    async fn run_pipeline(
        &self,
        videos: &VideoRepository,
        record: &VideoRecord,
        avatar: &Avatar,
    ) -> Result<String, FailureDetail> {
        let input = WorkflowInput::narration(&avatar.video_url, &record.script, record.voice);

        let mut stream = self.workflow.stream(&input).await.map_err(|e| {
            FailureDetail::new(FailureKind::Upstream, format!("Failed to start workflow: {}", e))
        })?;

        loop {
            let event = stream.next_event().await.map_err(|e| {
                FailureDetail::new(FailureKind::Upstream, format!("Workflow stream failed: {}", e))
            })?;

            match event {
                Some(progress @ WorkflowEvent::Progress { .. }) => {
                    debug!(video_id = %record.id, "Workflow progress event");

                    // Only the latest progress matters; overwrite the previous
                    // diagnostic. A failed progress write never aborts the run.
                    let diagnostic = serde_json::to_string(&progress)
                        .unwrap_or_else(|_| "{}".to_string());
                    if let Err(e) = videos
                        .update(&record.id, VideoPatch::new().error_message(Some(diagnostic)))
                        .await
                    {
                        warn!(video_id = %record.id, "Failed to record progress: {}", e);
                    }
                }
                Some(WorkflowEvent::Error {
                    node_id,
                    message,
                    error,
                }) => {
                    let text = message
                        .clone()
                        .or_else(|| error.clone())
                        .unwrap_or_else(|| "Workflow failed".to_string());
                    return Err(FailureDetail::new(
                        FailureKind::Upstream,
                        format!("Workflow error: {}", text),
                    )
                    .with_upstream(json!({
                        "type": "error",
                        "message": message,
                        "error": error,
                        "node_id": node_id.clone(),
                    }))
                    .with_node_id(node_id));
                }
                None => break,
            }
        }

        let result = stream.done().await.map_err(|e| {
            FailureDetail::new(FailureKind::Upstream, format!("Workflow stream failed: {}", e))
        })?;

        if result.is_error() {
            let node_id = result.node_id.clone();
            return Err(FailureDetail::new(
                FailureKind::Upstream,
                format!("Workflow error: {}", result.error_text()),
            )
            .with_upstream(json!({
                "type": result.result_type,
                "message": result.message,
                "error": result.error,
                "node_id": result.node_id,
            }))
            .with_node_id(node_id));
        }

        let asset = result
            .extract_video()
            .map_err(|e| FailureDetail::new(FailureKind::Upstream, e.to_string()))?;

        let bytes = self.download_video(&asset.url).await.map_err(|e| {
            FailureDetail::new(
                FailureKind::Finalization,
                format!("video generated but download failed: {}", e),
            )
        })?;

        if let Some(expected) = asset.file_size {
            if expected != bytes.len() as u64 {
                warn!(
                    video_id = %record.id,
                    expected,
                    actual = bytes.len(),
                    "Downloaded size differs from workflow-reported size"
                );
            }
        }

        let key = video_key(&record.user_id, record.id.as_str());

        let upload_start = Instant::now();
        self.storage
            .upload_bytes(bytes, &key, VIDEO_CONTENT_TYPE)
            .await
            .map_err(|e| {
                FailureDetail::new(
                    FailureKind::Finalization,
                    format!("video generated but upload failed: {}", e),
                )
            })?;
        metrics::record_upload_duration(upload_start.elapsed().as_secs_f64());

        self.storage
            .presign_get(&key, LONG_SIGNED_URL_EXPIRY)
            .await
            .map_err(|e| {
                FailureDetail::new(
                    FailureKind::Finalization,
                    format!("video generated but signing failed: {}", e),
                )
            })
    }

    /// Fetch the generated asset from the workflow's CDN.
    async fn download_video(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        info!(url, "Downloading generated video");
        let start = Instant::now();

        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        metrics::record_download_duration(start.elapsed().as_secs_f64());
        info!(size_bytes = bytes.len(), "Video downloaded successfully");

        Ok(bytes.to_vec())
    }
}
