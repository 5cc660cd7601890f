//! Avatar listing handlers.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use ugc_store::AvatarRepository;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAvatarsParams {
    /// `true` returns only the number of available avatars
    #[serde(default)]
    pub count: bool,
}

#[derive(Debug, Serialize)]
pub struct AvatarCountResponse {
    pub count: u64,
}

/// List available avatars.
///
/// GET /api/avatars?count=true|false
pub async fn list_avatars(
    State(state): State<AppState>,
    Query(params): Query<ListAvatarsParams>,
    _user: AuthUser,
) -> ApiResult<Response> {
    let avatars = AvatarRepository::new(state.store.clone());

    if params.count {
        let count = avatars.count().await?;
        return Ok(Json(AvatarCountResponse { count }).into_response());
    }

    Ok(Json(avatars.list().await?).into_response())
}
