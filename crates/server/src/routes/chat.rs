//! Dashboard context for the chat assistant.
//!
//! The chat reads back whatever snapshot the dashboard stored for its
//! session. When nothing is cached (first message, or the entry expired) a
//! fresh snapshot is assembled from the request's filters and role. That
//! snapshot is not stored: only the dashboard decides what the user sees.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use trial_view_types::{DashboardContext, MetricFilters};

use crate::dashboard::{assemble_dashboard_context, render_briefing};
use crate::error::ApiResult;
use crate::metrics::RequestTimer;
use crate::routes::dashboard::DashboardQuery;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContextResponse {
    pub session_id: String,
    pub from_cache: bool,
    /// Set only when served from the cache.
    pub age_minutes: Option<f64>,
    pub context: DashboardContext,
    /// Plain-text rendering of `context` for the model prompt.
    pub briefing: String,
}

/// GET /api/chat/context/{session_id}
pub async fn chat_context(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(filters): Query<MetricFilters>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<ChatContextResponse>> {
    let timer = RequestTimer::new("chat_context");

    let cached = state
        .context_cache
        .get(&session_id)
        .map(|ctx| (ctx, state.context_cache.age(&session_id)));

    let (context, from_cache, age_minutes) = match cached {
        Some((ctx, age)) => (ctx, true, age),
        None => {
            let role = match query.role() {
                Ok(role) => role,
                Err(e) => {
                    timer.finish_err(400);
                    return Err(e);
                }
            };
            tracing::debug!(session_id = %session_id, "No cached context, assembling");
            let ctx = assemble_dashboard_context(&state.db, &filters, role).await;
            (ctx, false, None)
        }
    };

    let briefing = render_briefing(&context);
    timer.finish_ok();
    Ok(Json(ChatContextResponse {
        session_id,
        from_cache,
        age_minutes,
        context,
        briefing,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat/context/{session_id}", get(chat_context))
}
