//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms, gauges)
//! - Helper functions for recording metrics

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    let mut installed = false;
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        match metrics::set_global_recorder(recorder) {
            Ok(()) => {
                installed = true;
                describe_metrics();
                tracing::info!("Prometheus metrics initialized");
            }
            Err(_) => tracing::warn!("Failed to set global metrics recorder (already set)"),
        }
        handle
    });
    installed
}

fn describe_metrics() {
    describe_counter!(
        "dashboard_requests_total",
        "Total number of API requests to dashboard endpoints"
    );
    describe_histogram!(
        "dashboard_request_duration_seconds",
        "Duration of API requests in seconds"
    );
    describe_counter!(
        "query_failures_total",
        "Dashboard queries that failed and were replaced by an empty result"
    );
    describe_gauge!(
        "context_cache_entries",
        "Session contexts currently held by the cache, expired or not"
    );
    describe_counter!(
        "context_cache_evictions_total",
        "Session contexts removed because their TTL elapsed"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a completed API request.
///
/// # Arguments
/// * `endpoint` - The API endpoint name (e.g., "kpis", "patient_360")
/// * `status` - HTTP status code as string (e.g., "200", "404", "500")
/// * `duration` - Request duration from start instant
pub fn record_request(endpoint: &str, status: &str, duration: Duration) {
    counter!("dashboard_requests_total", "endpoint" => endpoint.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!("dashboard_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

/// Count a query whose error was swallowed at the HTTP boundary.
pub fn record_query_failure(operation: &'static str) {
    counter!("query_failures_total", "operation" => operation).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("context_cache_entries").set(entries as f64);
}

pub fn record_cache_evictions(removed: usize) {
    if removed > 0 {
        counter!("context_cache_evictions_total").increment(removed as u64);
    }
}

/// Helper for timing request handlers.
///
/// Usage:
/// ```ignore
/// let timer = RequestTimer::new("kpis");
/// // ... do work ...
/// timer.finish_ok(); // or timer.finish_err(status_code)
/// ```
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn finish_ok(self) {
        record_request(self.endpoint, "200", self.start.elapsed());
    }

    pub fn finish_err(self, status: u16) {
        record_request(self.endpoint, &status.to_string(), self.start.elapsed());
    }
}
