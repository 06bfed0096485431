//! One endpoint per dashboard chart.
//!
//! Every handler takes the filter tuple from the query string and always
//! answers 200: a failed query renders as its empty shape.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use trial_view_db::DbResult;
use trial_view_types::{
    AgingBucket, CleanStatusSummary, DqiBucket, KpiSummary, MetricFilters, QueryTypeCount,
    RegionSummary, SaeStatusCount, SignatureCompliance, SiteDeviationCount, SiteMissingCount,
    SiteQueryCount, SiteRisk, StatusCount,
};

use crate::fallback::or_default;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// Default number of rows for the risk-site table.
pub const DEFAULT_RISK_SITES: u32 = 10;

async fn chart<T, F>(operation: &'static str, query: F) -> Json<T>
where
    T: Default,
    F: Future<Output = DbResult<T>>,
{
    let timer = RequestTimer::new(operation);
    let value = or_default(operation, query).await;
    timer.finish_ok();
    Json(value)
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RiskSitesQuery {
    /// Clamped to 1..=100 by the query layer.
    pub limit: Option<u32>,
}

/// GET /api/metrics/kpis
pub async fn kpis(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<KpiSummary> {
    chart("kpi_summary", state.db.kpi_summary(&filters)).await
}

/// GET /api/metrics/queries/by-type
pub async fn queries_by_type(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<QueryTypeCount>> {
    chart("queries_by_type", state.db.queries_by_type(&filters)).await
}

/// GET /api/metrics/queries/by-site
pub async fn queries_by_site(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<SiteQueryCount>> {
    chart("queries_by_site", state.db.queries_by_site(&filters)).await
}

/// GET /api/metrics/queries/status
pub async fn query_status(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<StatusCount>> {
    chart("query_status_breakdown", state.db.query_status_breakdown(&filters)).await
}

/// GET /api/metrics/queries/aging
pub async fn query_aging(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<AgingBucket>> {
    chart("query_aging", state.db.query_aging(&filters)).await
}

/// GET /api/metrics/missing-visits
pub async fn missing_visits(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<SiteMissingCount>> {
    chart("missing_visits_by_site", state.db.missing_visits_by_site(&filters)).await
}

/// GET /api/metrics/deviations/by-site
pub async fn deviations_by_site(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<SiteDeviationCount>> {
    chart(
        "protocol_deviations_by_site",
        state.db.protocol_deviations_by_site(&filters),
    )
    .await
}

/// GET /api/metrics/deviations/status
pub async fn deviation_status(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<StatusCount>> {
    chart(
        "protocol_deviation_status",
        state.db.protocol_deviation_status(&filters),
    )
    .await
}

/// GET /api/metrics/sae
pub async fn sae(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<SaeStatusCount>> {
    chart("sae_summary", state.db.sae_summary(&filters)).await
}

/// GET /api/metrics/signatures
pub async fn signatures(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<SignatureCompliance> {
    chart("signature_compliance", state.db.signature_compliance(&filters)).await
}

/// GET /api/metrics/dqi
pub async fn dqi(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<DqiBucket>> {
    chart("dqi_distribution", state.db.dqi_distribution(&filters)).await
}

/// GET /api/metrics/clean-status
pub async fn clean_status(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<CleanStatusSummary> {
    chart("clean_status_summary", state.db.clean_status_summary(&filters)).await
}

/// GET /api/metrics/regions
pub async fn regions(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<Vec<RegionSummary>> {
    chart("region_summary", state.db.region_summary(&filters)).await
}

/// GET /api/metrics/risk-sites?limit=N
pub async fn risk_sites(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
    Query(query): Query<RiskSitesQuery>,
) -> Json<Vec<SiteRisk>> {
    let limit = query.limit.unwrap_or(DEFAULT_RISK_SITES);
    chart("top_risk_sites", state.db.top_risk_sites(&filters, limit)).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metrics/kpis", get(kpis))
        .route("/metrics/queries/by-type", get(queries_by_type))
        .route("/metrics/queries/by-site", get(queries_by_site))
        .route("/metrics/queries/status", get(query_status))
        .route("/metrics/queries/aging", get(query_aging))
        .route("/metrics/missing-visits", get(missing_visits))
        .route("/metrics/deviations/by-site", get(deviations_by_site))
        .route("/metrics/deviations/status", get(deviation_status))
        .route("/metrics/sae", get(sae))
        .route("/metrics/signatures", get(signatures))
        .route("/metrics/dqi", get(dqi))
        .route("/metrics/clean-status", get(clean_status))
        .route("/metrics/regions", get(regions))
        .route("/metrics/risk-sites", get(risk_sites))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get_json, seeded_app};
    use axum::http::StatusCode;
    use serde_json::json;
    use trial_view_db::Database;

    const CHART_ROUTES: [&str; 14] = [
        "/api/metrics/kpis",
        "/api/metrics/queries/by-type",
        "/api/metrics/queries/by-site",
        "/api/metrics/queries/status",
        "/api/metrics/queries/aging",
        "/api/metrics/missing-visits",
        "/api/metrics/deviations/by-site",
        "/api/metrics/deviations/status",
        "/api/metrics/sae",
        "/api/metrics/signatures",
        "/api/metrics/dqi",
        "/api/metrics/clean-status",
        "/api/metrics/regions",
        "/api/metrics/risk-sites",
    ];

    #[tokio::test]
    async fn test_kpis_filtered_by_study() {
        let app = seeded_app().await;

        let (status, all) = get_json(app.clone(), "/api/metrics/kpis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["totalSubjects"], 2);
        assert_eq!(all["openQueries"], 3);
        assert_eq!(all["cleanSubjects"], 1);
        assert_eq!(all["cleanPercentage"], 50.0);

        let (_, study1) = get_json(app, "/api/metrics/kpis?study=Study%201").await;
        assert_eq!(study1["totalSubjects"], 1);
        assert_eq!(study1["openQueries"], 2);
        assert_eq!(study1["avgDqi"], 88.0);
    }

    #[tokio::test]
    async fn test_queries_by_type_and_aging() {
        let app = seeded_app().await;

        let (_, types) = get_json(app.clone(), "/api/metrics/queries/by-type").await;
        assert_eq!(
            types,
            json!([
                {"queryType": "DM", "count": 2},
                {"queryType": "Medical", "count": 1},
            ])
        );

        let (_, aging) = get_json(app, "/api/metrics/queries/aging").await;
        let counts: Vec<u64> = aging
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["count"].as_u64().unwrap())
            .collect();
        assert_eq!(counts, vec![0, 1, 0, 0]);
    }

    #[tokio::test]
    async fn test_risk_sites_limit_param() {
        let app = seeded_app().await;

        let (_, sites) = get_json(app.clone(), "/api/metrics/risk-sites").await;
        let order: Vec<&str> = sites
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["siteId"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["Site 201", "Site 101"]);

        let (_, one) = get_json(app, "/api/metrics/risk-sites?limit=1").await;
        assert_eq!(one.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dqi_has_five_buckets() {
        let (_, buckets) = get_json(seeded_app().await, "/api/metrics/dqi").await;
        let buckets = buckets.as_array().unwrap();
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[1]["subjects"], 1);
        assert_eq!(buckets[4]["subjects"], 1);
    }

    #[tokio::test]
    async fn test_every_chart_renders_on_broken_store() {
        let db = Database::new_in_memory().await.unwrap();
        db.pool().close().await;
        let app = crate::create_app(db);

        for route in CHART_ROUTES {
            let (status, json) = get_json(app.clone(), route).await;
            assert_eq!(status, StatusCode::OK, "{} should still render", route);
            assert!(
                json.is_array() || json.is_object(),
                "{} returned {}",
                route,
                json
            );
            assert!(json.get("error").is_none(), "{} leaked an error", route);
        }
    }

    #[tokio::test]
    async fn test_every_chart_renders_on_empty_store() {
        let app = crate::create_app(Database::new_in_memory().await.unwrap());

        for route in CHART_ROUTES {
            let (status, _) = get_json(app.clone(), route).await;
            assert_eq!(status, StatusCode::OK, "{}", route);
        }
    }
}
