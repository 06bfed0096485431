//! API route handlers for the trial-view server.

pub mod charts;
pub mod chat;
pub mod context;
pub mod dashboard;
pub mod filters;
pub mod health;
pub mod metrics;
pub mod subjects;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check with cache statistics
/// - GET /api/status - Store location and per-table row counts
/// - GET /api/filters - Filter dropdown options for the current tuple
/// - GET /api/dashboard - Role-specific dashboard snapshot (cached per sessionId)
/// - GET /api/metrics/... - One chart payload per query
/// - GET /api/subjects - Paginated subject metrics
/// - GET /api/subjects/{subject_id}/360 - Patient 360
/// - GET /api/context/stats - Context cache statistics
/// - GET /api/context/{session_id} - Cached snapshot
/// - DELETE /api/context/{session_id} - Drop a cached snapshot
/// - GET /api/context/{session_id}/age - Snapshot age in minutes
/// - POST /api/context/sweep - Remove expired snapshots now
/// - GET /api/chat/context/{session_id} - Snapshot plus text briefing for chat
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", filters::router())
        .nest("/api", dashboard::router())
        .nest("/api", charts::router())
        .nest("/api", subjects::router())
        .nest("/api", context::router())
        .nest("/api", chat::router())
        .merge(metrics::router())
        .with_state(state)
}
