//! Shared helpers for route tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use trial_view_db::{fixtures::SubjectFixture, Database};

use crate::context_cache::{CacheConfig, ManualClock, SessionContextCache};
use crate::state::AppState;

/// Two subjects in different studies, regions and sites.
///
/// SUB-1: Study 1 / EMEA / DEU / Site 101, 2 DM queries (one open in
/// query_report), 1 missing visit, 1 DM SAE, DQI 88 Good, Clean.
/// SUB-2: Study 2 / NA / USA / Site 201, 1 medical query, DQI 35 Critical.
pub async fn seeded_db() -> Database {
    let db = Database::new_in_memory().await.expect("in-memory DB");

    let one = SubjectFixture {
        dm_queries: 2,
        missing_visits: 1,
        sae_dm: 1,
        crfs_signed: 3,
        ..SubjectFixture::new("Study 1", "EMEA", "DEU", "Site 101", "SUB-1")
    };
    one.insert(db.pool()).await.unwrap();
    one.insert_dqi(db.pool(), 88.0, Some("Good"), "Clean", 11, None)
        .await
        .unwrap();
    one.insert_query(db.pool(), Some("Open"), Some("DM Review"), Some(12))
        .await
        .unwrap();
    one.insert_sae(db.pool(), "DISC-1", "DM", "Review Pending", "2025-02-01")
        .await
        .unwrap();

    let two = SubjectFixture {
        medical_queries: 1,
        ..SubjectFixture::new("Study 2", "NA", "USA", "Site 201", "SUB-2")
    };
    two.insert(db.pool()).await.unwrap();
    two.insert_dqi(db.pool(), 35.0, Some("Critical"), "Not Clean", 7, Some("no_open_queries"))
        .await
        .unwrap();

    db
}

pub async fn seeded_app() -> Router {
    crate::create_app(seeded_db().await)
}

/// Seeded state whose context cache runs on a hand-advanced clock.
pub async fn state_with_clock() -> (Arc<AppState>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = SessionContextCache::with_clock(CacheConfig::default(), clock.clone());
    let state = AppState::with_cache(seeded_db().await, Arc::new(cache));
    (state, clock)
}

pub async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// GET and parse the body as JSON.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, Method::GET, uri).await;
    let json = serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("non-JSON body from {}: {} ({})", uri, body, e));
    (status, json)
}
