// crates/db/src/queries/mod.rs
// Filter-parameterized read queries over the metrics store.
//
// Every function takes the full filter tuple, builds its predicate through
// `WhereClause`, and returns `DbResult`. Flattening failures into empty
// payloads is the HTTP boundary's job, not this layer's.

mod deviations;
mod options;
mod overview;
mod query_metrics;
mod quality;
pub(crate) mod row_types;
mod safety;
mod signatures;
mod subjects;
mod visits;

/// LEFT JOIN of the DQI/clean-status row onto `subject_level_metrics m`.
pub(crate) const JOIN_DQI: &str = " LEFT JOIN subject_dqi_clean_status d \
     ON d.project_name = m.project_name AND d.site_id = m.site_id AND d.subject_id = m.subject_id";

/// SQL expression mapping a nullable text column to a display label.
pub(crate) fn label_or_unknown(column: &str) -> String {
    format!("COALESCE(NULLIF(TRIM({}), ''), 'Unknown')", column)
}

/// Clamp a SQLite integer to a non-negative count.
pub(crate) fn non_negative(value: i64) -> u64 {
    value.max(0) as u64
}

/// Clamp a float to a non-negative, finite value.
pub(crate) fn non_negative_f64(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// `part / whole` as a 0-100 percentage rounded to two decimals.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
