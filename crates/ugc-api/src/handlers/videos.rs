//! Video retrieval and listing handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ugc_models::{VideoId, VideoRecord, VideoStatus};
use ugc_storage::video_key;
use ugc_store::VideoRepository;

use crate::auth::AuthUser;
use crate::config::SIGNED_URL_EXPIRY;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Cache lifetime for proxied video bytes.
const PROXY_CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct GetVideoParams {
    /// `true` redirects to a fresh signed URL instead of proxying bytes
    #[serde(default)]
    pub download: bool,
}

/// Fetch one of the caller's videos.
///
/// GET /api/video/{id}?download=true|false
///
/// With `download=true` the caller is redirected (307) to a short-lived
/// signed URL. Otherwise the bytes are proxied with range support so the
/// browser can seek.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<GetVideoParams>,
    headers: HeaderMap,
    user: AuthUser,
) -> ApiResult<Response> {
    let videos = VideoRepository::new(state.store.clone(), &user.uid);
    let record = videos
        .get(&VideoId::from(video_id.as_str()))
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if record.status != VideoStatus::Completed {
        warn!(video_id = %record.id, status = %record.status, "Video not ready for retrieval");
        return Err(ApiError::validation("Video is not ready"));
    }

    let key = video_key(&user.uid, record.id.as_str());

    if params.download {
        let signed = state.storage.presign_get(&key, SIGNED_URL_EXPIRY).await?;
        info!(video_id = %record.id, "Redirecting to signed download URL");
        return Ok(Redirect::temporary(&signed).into_response());
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let part = state
        .storage
        .get_object_range(&key, range.as_deref())
        .await?;

    let status = if part.content_range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, part.content_type)
        .header(header::CONTENT_LENGTH, part.content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, PROXY_CACHE_CONTROL);

    if let Some(content_range) = part.content_range {
        response = response.header(header::CONTENT_RANGE, content_range);
    }

    response
        .body(axum::body::Body::from(part.bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    /// `true` returns aggregate counts instead of records
    #[serde(default)]
    pub stats: bool,
}

/// Aggregate counts over the caller's videos.
#[derive(Debug, Serialize)]
pub struct VideoStats {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub failed: usize,
}

impl VideoStats {
    fn from_records(records: &[VideoRecord]) -> Self {
        Self {
            total: records.len(),
            completed: count_status(records, VideoStatus::Completed),
            processing: count_status(records, VideoStatus::Processing),
            failed: count_status(records, VideoStatus::Failed),
        }
    }
}

fn count_status(records: &[VideoRecord], status: VideoStatus) -> usize {
    records.iter().filter(|r| r.status == status).count()
}

/// List the caller's videos.
///
/// GET /api/videos?stats=true|false
pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListVideosParams>,
    user: AuthUser,
) -> ApiResult<Response> {
    let videos = VideoRepository::new(state.store.clone(), &user.uid);
    let records = videos.list().await?;

    if params.stats {
        return Ok(Json(VideoStats::from_records(&records)).into_response());
    }

    Ok(Json(records).into_response())
}
