use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;

use stockbook_core::ActivityLog;
use stockbook_db::DEFAULT_ACTIVITY_LIMIT;

use crate::auth::Session;
use crate::error::ApiResult;
use crate::state::AppState;

/// Upper bound on `limit`.
pub const MAX_ACTIVITY_LIMIT: u32 = 500;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/activity", get(list_activity))
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<u32>,
}

/// GET /api/activity?limit=
///
/// Newest first. `limit` is clamped to `1..=500`.
pub async fn list_activity(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Vec<ActivityLog>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);

    let logs = state.db.activity().recent(&session.owner_id, limit).await?;
    Ok(Json(logs))
}
