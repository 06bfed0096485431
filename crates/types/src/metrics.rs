// crates/types/src/metrics.rs
//! Aggregated records returned by the dashboard query layer.
//!
//! Every numeric field is non-negative; missing values are reported as zero.
//! `Default` yields the "empty" shape a chart can still render.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::dqi::{DqiCategory, FailingCriterion};

/// Distinct values available for each filter dropdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub studies: Vec<String>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub sites: Vec<String>,
    pub subjects: Vec<String>,
}

/// Headline KPI tiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    #[ts(type = "number")]
    pub total_subjects: u64,
    #[ts(type = "number")]
    pub total_sites: u64,
    #[ts(type = "number")]
    pub open_queries: u64,
    #[ts(type = "number")]
    pub missing_visits: u64,
    #[ts(type = "number")]
    pub missing_pages: u64,
    #[ts(type = "number")]
    pub protocol_deviations: u64,
    #[ts(type = "number")]
    pub sae_issues: u64,
    #[ts(type = "number")]
    pub uncoded_terms: u64,
    #[ts(type = "number")]
    pub crfs_require_verification: u64,
    pub avg_dqi: f64,
    #[ts(type = "number")]
    pub clean_subjects: u64,
    /// 0-100.
    pub clean_percentage: f64,
}

/// Open queries for one query type (DM, clinical, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct QueryTypeCount {
    pub query_type: String,
    #[ts(type = "number")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SiteQueryCount {
    pub study: String,
    pub site_id: String,
    #[ts(type = "number")]
    pub total_queries: u64,
    #[ts(type = "number")]
    pub subjects: u64,
}

/// Row count for one status value (query status, PD status, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    #[ts(type = "number")]
    pub count: u64,
}

/// Open queries by age since opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct AgingBucket {
    pub bucket: String,
    #[ts(type = "number")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SiteMissingCount {
    pub study: String,
    pub site_id: String,
    #[ts(type = "number")]
    pub missing_visits: u64,
    #[ts(type = "number")]
    pub missing_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SiteDeviationCount {
    pub study: String,
    pub site_id: String,
    #[ts(type = "number")]
    pub confirmed: u64,
    #[ts(type = "number")]
    pub proposed: u64,
    #[ts(type = "number")]
    pub total: u64,
}

/// SAE discrepancies by responsible function and review status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SaeStatusCount {
    pub responsible: String,
    pub review_status: String,
    #[ts(type = "number")]
    pub count: u64,
}

/// PI signature compliance across the filtered subjects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SignatureCompliance {
    #[ts(type = "number")]
    pub crfs_signed: u64,
    #[ts(type = "number")]
    pub overdue_within_45_days: u64,
    #[ts(type = "number")]
    pub overdue_45_to_90_days: u64,
    #[ts(type = "number")]
    pub overdue_beyond_90_days: u64,
    #[ts(type = "number")]
    pub broken_signatures: u64,
    #[ts(type = "number")]
    pub never_signed: u64,
    /// Signed / (signed + overdue + never signed), 0-100.
    pub compliance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct DqiBucket {
    pub category: DqiCategory,
    #[ts(type = "number")]
    pub subjects: u64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct CleanStatusSummary {
    #[ts(type = "number")]
    pub clean: u64,
    #[ts(type = "number")]
    pub not_clean: u64,
    /// Subjects in the metrics table with no DQI/clean-status row yet.
    #[ts(type = "number")]
    pub not_assessed: u64,
    pub clean_percentage: f64,
    pub avg_criteria_met: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub region: String,
    #[ts(type = "number")]
    pub subjects: u64,
    #[ts(type = "number")]
    pub sites: u64,
    #[ts(type = "number")]
    pub open_queries: u64,
    pub avg_dqi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SiteRisk {
    pub study: String,
    pub site_id: String,
    pub country: Option<String>,
    #[ts(type = "number")]
    pub subjects: u64,
    pub avg_dqi: f64,
    #[ts(type = "number")]
    pub open_queries: u64,
    #[ts(type = "number")]
    pub missing_visits: u64,
    #[ts(type = "number")]
    pub sae_issues: u64,
}

/// One row of the subject metrics table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SubjectMetricRow {
    pub study: String,
    pub region: Option<String>,
    pub country: Option<String>,
    pub site_id: String,
    pub subject_id: String,
    pub latest_visit: Option<String>,
    pub subject_status: Option<String>,
    #[ts(type = "number")]
    pub missing_visits: u64,
    #[ts(type = "number")]
    pub missing_pages: u64,
    #[ts(type = "number")]
    pub total_queries: u64,
    #[ts(type = "number")]
    pub dm_queries: u64,
    #[ts(type = "number")]
    pub clinical_queries: u64,
    #[ts(type = "number")]
    pub medical_queries: u64,
    #[ts(type = "number")]
    pub site_queries: u64,
    #[ts(type = "number")]
    pub field_monitor_queries: u64,
    #[ts(type = "number")]
    pub coding_queries: u64,
    #[ts(type = "number")]
    pub safety_queries: u64,
    #[ts(type = "number")]
    pub uncoded_terms: u64,
    #[ts(type = "number")]
    pub pages_entered: u64,
    #[ts(type = "number")]
    pub pages_non_conformant: u64,
    #[ts(type = "number")]
    pub crfs_require_verification: u64,
    #[ts(type = "number")]
    pub pds_confirmed: u64,
    #[ts(type = "number")]
    pub pds_proposed: u64,
    #[ts(type = "number")]
    pub sae_dm: u64,
    #[ts(type = "number")]
    pub sae_safety: u64,
    #[ts(type = "number")]
    pub crfs_signed: u64,
    #[ts(type = "number")]
    pub crfs_overdue_within_45_days: u64,
    #[ts(type = "number")]
    pub crfs_overdue_45_to_90_days: u64,
    #[ts(type = "number")]
    pub crfs_overdue_beyond_90_days: u64,
    #[ts(type = "number")]
    pub broken_signatures: u64,
    #[ts(type = "number")]
    pub crfs_never_signed: u64,
    pub percentage_clean_crf: f64,
    pub dqi_score: Option<f64>,
    pub dqi_category: Option<DqiCategory>,
    pub clean_status: Option<String>,
}

/// Paginated subject metrics (`total` counts every matching subject).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SubjectMetricsPage {
    pub rows: Vec<SubjectMetricRow>,
    #[ts(type = "number")]
    pub total: u64,
    #[ts(type = "number")]
    pub page: u64,
    #[ts(type = "number")]
    pub page_size: u64,
}

/// Page request for [`SubjectMetricsPage`]. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u64 = 50;
    pub const MAX_PAGE_SIZE: u64 = 500;

    /// Clamp to page >= 1 and 1 <= page_size <= MAX_PAGE_SIZE.
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_PAGE_SIZE)
                .clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates at `i64::MAX`, the largest offset SQLite binds.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ============================================================================
// Patient 360
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SubjectQuality {
    pub dqi_score: f64,
    pub dqi_category: Option<DqiCategory>,
    pub clean_status: Option<String>,
    #[ts(type = "number")]
    pub criteria_met: u64,
    #[ts(type = "number")]
    pub criteria_total: u64,
    pub failing_criteria: Vec<FailingCriterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub visit_name: Option<String>,
    pub visit_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct OverdueVisit {
    pub visit_name: Option<String>,
    pub projected_date: Option<String>,
    #[ts(type = "number")]
    pub days_outstanding: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct MissingPage {
    pub page_type: Option<String>,
    pub visit_name: Option<String>,
    pub form_name: Option<String>,
    #[ts(type = "number")]
    pub days_missing: u64,
}

/// Open queries for the subject grouped by marking group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct OpenQueryGroup {
    pub marking_group: String,
    #[ts(type = "number")]
    pub count: u64,
    #[ts(type = "number")]
    pub oldest_days_open: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct SaeRecord {
    pub discrepancy_id: Option<String>,
    pub form_name: Option<String>,
    pub case_status: Option<String>,
    pub review_status: Option<String>,
    pub action_status: Option<String>,
    pub responsible: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct DeviationRecord {
    pub visit_name: Option<String>,
    pub form_name: Option<String>,
    pub status: Option<String>,
    pub visit_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct PendingSignature {
    pub visit_name: Option<String>,
    pub form_name: Option<String>,
    #[ts(type = "number")]
    pub days_pending: u64,
    pub pending_since: Option<String>,
}

/// Everything known about one subject, merged from several tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct Patient360 {
    pub metrics: SubjectMetricRow,
    pub quality: Option<SubjectQuality>,
    pub recent_visits: Vec<VisitRecord>,
    pub overdue_visits: Vec<OverdueVisit>,
    pub missing_pages: Vec<MissingPage>,
    pub open_queries: Vec<OpenQueryGroup>,
    pub recent_sae: Vec<SaeRecord>,
    pub protocol_deviations: Vec<DeviationRecord>,
    pub pending_signatures: Vec<PendingSignature>,
}
