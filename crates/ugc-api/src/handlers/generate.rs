//! Video generation handler.

use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{GenerateVideoRequest, GenerateVideoResponse};
use crate::state::AppState;

/// Run the generation pipeline for an authenticated caller.
///
/// POST /api/video/generate
///
/// The request blocks until the pipeline reaches a terminal state; on success
/// the response carries the long-lived signed URL.
pub async fn generate_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<GenerateVideoRequest>,
) -> ApiResult<Json<GenerateVideoResponse>> {
    let response = state.generation.generate(&user, request).await?;
    Ok(Json(response))
}
