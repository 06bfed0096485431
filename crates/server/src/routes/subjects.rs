//! Subject metrics table and Patient 360.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use trial_view_types::{MetricFilters, PageRequest, Patient360, SubjectMetricsPage};

use crate::error::{ApiError, ApiResult};
use crate::fallback::{or_default, or_none};
use crate::metrics::RequestTimer;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PagingQuery {
    /// 1-based.
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PagingQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// GET /api/subjects - One page of the subject metrics table.
pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MetricFilters>,
    Query(paging): Query<PagingQuery>,
) -> Json<SubjectMetricsPage> {
    let timer = RequestTimer::new("list_subject_metrics");
    let request = paging.request();
    let mut page = or_default(
        "list_subject_metrics",
        state.db.list_subject_metrics(&filters, request),
    )
    .await;
    // A failed query still echoes the page that was asked for.
    if page.page == 0 {
        page.page = request.page;
        page.page_size = request.page_size;
    }
    timer.finish_ok();
    Json(page)
}

/// GET /api/subjects/{subject_id}/360 - Patient 360 for one subject.
///
/// The active filters still apply: a subject outside them is not found.
pub async fn patient_360(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
    Query(filters): Query<MetricFilters>,
) -> ApiResult<Json<Patient360>> {
    let timer = RequestTimer::new("patient_360");
    match or_none("patient_360", state.db.patient_360(&filters, &subject_id)).await {
        Some(view) => {
            timer.finish_ok();
            Ok(Json(view))
        }
        None => {
            timer.finish_err(404);
            Err(ApiError::SubjectNotFound(subject_id))
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subjects", get(list_subjects))
        .route("/subjects/{subject_id}/360", get(patient_360))
}
