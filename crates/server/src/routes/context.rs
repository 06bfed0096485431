//! Session context cache endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use trial_view_types::DashboardContext;

use crate::context_cache::CacheStats;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAgeResponse {
    pub session_id: String,
    pub age_minutes: f64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
}

/// GET /api/context/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.context_cache.stats())
}

/// GET /api/context/{session_id} - The live snapshot for a session.
pub async fn get_context(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DashboardContext>> {
    state
        .context_cache
        .get(&session_id)
        .map(Json)
        .ok_or(ApiError::ContextNotFound(session_id))
}

/// DELETE /api/context/{session_id}
pub async fn delete_context(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.context_cache.delete(&session_id);
    if deleted {
        tracing::debug!(session_id = %session_id, "Deleted session context");
    }
    Json(DeleteResponse { deleted })
}

/// GET /api/context/{session_id}/age
pub async fn context_age(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<ContextAgeResponse>> {
    match state.context_cache.age(&session_id) {
        Some(age_minutes) => Ok(Json(ContextAgeResponse {
            session_id,
            age_minutes,
        })),
        None => Err(ApiError::ContextNotFound(session_id)),
    }
}

/// POST /api/context/sweep - Remove expired snapshots without waiting for
/// the periodic sweep.
pub async fn sweep(State(state): State<Arc<AppState>>) -> Json<SweepResponse> {
    let removed = state.context_cache.sweep();
    tracing::info!(removed, "Manual context sweep");
    Json(SweepResponse { removed })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/context/stats", get(cache_stats))
        .route("/context/sweep", post(sweep))
        .route("/context/{session_id}", get(get_context).delete(delete_context))
        .route("/context/{session_id}/age", get(context_age))
}
