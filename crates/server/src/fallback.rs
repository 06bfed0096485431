//! Boundary between the query layer and the HTTP surface.
//!
//! Query functions return `DbResult<T>` so failures stay visible to tests.
//! Dashboard endpoints must always render, so a failed query is logged,
//! counted, and replaced with the empty shape of its result here. No other
//! code swallows query errors.

use std::future::Future;

use trial_view_db::DbResult;

use crate::metrics::record_query_failure;

/// Await a query, substituting `T::default()` on failure.
pub async fn or_default<T, F>(operation: &'static str, query: F) -> T
where
    T: Default,
    F: Future<Output = DbResult<T>>,
{
    match query.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(operation, error = %e, "Dashboard query failed; rendering empty result");
            record_query_failure(operation);
            T::default()
        }
    }
}

/// Await an optional lookup, treating failure the same as "not found".
pub async fn or_none<T, F>(operation: &'static str, query: F) -> Option<T>
where
    F: Future<Output = DbResult<Option<T>>>,
{
    match query.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(operation, error = %e, "Lookup failed; treating as not found");
            record_query_failure(operation);
            None
        }
    }
}
