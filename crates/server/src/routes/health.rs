// crates/server/src/routes/health.rs
//! Health and store status endpoints.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::context_cache::CacheStats;
use crate::error::ApiResult;
use crate::state::AppState;

/// Response for the health check endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub context_cache: CacheStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCount {
    pub table: String,
    pub rows: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Empty for in-memory stores.
    pub db_path: String,
    pub tables: Vec<TableCount>,
}

/// GET /api/health - Health check endpoint.
///
/// Returns server status, version, uptime, and context cache counts.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        context_cache: state.context_cache.stats(),
    })
}

/// GET /api/status - Where the store lives and how much it holds.
///
/// Unlike the chart endpoints this surfaces store errors as 500: a status
/// page reporting zero rows for an unreadable store would be wrong.
pub async fn store_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusResponse>> {
    let tables = state
        .db
        .table_row_counts()
        .await?
        .into_iter()
        .map(|(table, rows)| TableCount { table, rows })
        .collect();

    Ok(Json(StatusResponse {
        db_path: state.db.db_path().display().to_string(),
        tables,
    }))
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(store_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_json, seeded_app};
    use axum::http::StatusCode;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            context_cache: CacheStats::default(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"uptimeSecs\":42"));
        assert!(json.contains("\"contextCache\":{\"total\":0"));
    }

    #[tokio::test]
    async fn test_status_lists_table_counts() {
        let (status, json) = get_json(seeded_app().await, "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        let tables = json["tables"].as_array().unwrap();
        let metrics = tables
            .iter()
            .find(|t| t["table"] == "subject_level_metrics")
            .unwrap();
        assert_eq!(metrics["rows"], 2);
        assert_eq!(json["dbPath"], "");
    }

    #[tokio::test]
    async fn test_status_reports_store_failure() {
        let db = trial_view_db::Database::new_in_memory().await.unwrap();
        db.pool().close().await;
        let app = crate::create_app(db);

        let (status, json) = get_json(app, "/api/status").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Database error");
    }
}
