// crates/types/src/lib.rs
//! Shared data types for trial-view: the filter tuple, aggregated metric
//! records, DQI vocabulary, and the dashboard context snapshot.

pub mod context;
pub mod dqi;
pub mod filters;
pub mod metrics;

pub use context::{DashboardContext, DashboardRole, DashboardSection, UnknownRole};
pub use dqi::{
    parse_failing_criteria, CleanCriterion, DqiCategory, FailingCriterion, CLEAN_STATUS_CLEAN,
};
pub use filters::{normalize_filter_value, FilterDimension, MetricFilters, ALL};
pub use metrics::*;
