// crates/server/src/lib.rs
//! Trial-view server library.
//!
//! Axum HTTP API over the clinical-trial metrics store: filter options, one
//! endpoint per dashboard chart, Patient 360, role-specific dashboard
//! snapshots and the per-session context cache the chat assistant reads.

pub mod config;
pub mod context_cache;
pub mod dashboard;
pub mod error;
pub mod fallback;
pub mod metrics;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

pub use context_cache::{CacheConfig, CacheStats, SessionContextCache, SweepHandle};
pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use trial_view_db::Database;

/// Create the Axum application with a default context cache.
///
/// The cache's periodic sweep is not started; expired entries are still
/// removed on read.
pub fn create_app(db: Database) -> Router {
    create_app_with_state(AppState::new(db))
}

/// Create the Axum application around existing state.
///
/// This sets up:
/// - API routes under `/api` and the Prometheus `/metrics` endpoint
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app_with_state(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
