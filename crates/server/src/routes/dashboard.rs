//! Role-specific dashboard snapshot.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use trial_view_types::{DashboardContext, DashboardRole, MetricFilters};

use crate::dashboard::assemble_dashboard_context;
use crate::error::{ApiError, ApiResult};
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// Non-filter query parameters shared by dashboard and chat endpoints.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardQuery {
    /// study_manager (default), cra, data_manager, safety
    pub role: Option<String>,
    /// Chat session to store the snapshot under.
    pub session_id: Option<String>,
}

impl DashboardQuery {
    pub fn role(&self) -> ApiResult<DashboardRole> {
        match self.role.as_deref() {
            None => Ok(DashboardRole::default()),
            Some(raw) => raw
                .parse::<DashboardRole>()
                .map_err(|e| ApiError::BadRequest(e.to_string())),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// GET /api/dashboard - Assemble every chart the role shows.
///
/// With `sessionId`, the snapshot is also stored in the context cache,
/// replacing any earlier one for that session.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardContext>> {
    let timer = RequestTimer::new("dashboard");
    let role = match query.role() {
        Ok(role) => role,
        Err(e) => {
            timer.finish_err(400);
            return Err(e);
        }
    };

    let ctx = assemble_dashboard_context(&state.db, &filters, role).await;

    if let Some(session_id) = query.session_id() {
        state.context_cache.put(session_id, ctx.clone());
        tracing::debug!(session_id, role = %role, "Stored dashboard context");
    }

    timer.finish_ok();
    Ok(Json(ctx))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(get_dashboard))
}
