//! Filter dropdown options.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use trial_view_types::{FilterOptions, MetricFilters};

use crate::fallback::or_default;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// GET /api/filters - Distinct values for every dropdown.
///
/// Each list is narrowed by the dimensions above it only, so the current
/// selection stays in its own list.
pub async fn filter_options(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
) -> Json<FilterOptions> {
    let timer = RequestTimer::new("filter_options");
    let options = or_default("filter_options", state.db.filter_options(&filters)).await;
    timer.finish_ok();
    Json(options)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/filters", get(filter_options))
}
