// crates/db/src/queries/row_types.rs
// Internal row types for the wide subject queries.

use super::{non_negative, non_negative_f64};
use sqlx::Row;
use trial_view_types::{
    parse_failing_criteria, DqiCategory, SubjectMetricRow, SubjectQuality,
};

/// Column list matching [`SubjectRow`]. Expects `subject_level_metrics m`
/// LEFT JOINed to `subject_dqi_clean_status d`.
pub(crate) const SUBJECT_COLUMNS: &str = r#"
    m.project_name AS study,
    m.region AS region,
    m.country AS country,
    m.site_id AS site_id,
    m.subject_id AS subject_id,
    m.latest_visit AS latest_visit,
    m.subject_status AS subject_status,
    COALESCE(m.missing_visits, 0) AS missing_visits,
    COALESCE(m.missing_page, 0) AS missing_pages,
    COALESCE(m.total_queries, 0) AS total_queries,
    COALESCE(m.dm_queries, 0) AS dm_queries,
    COALESCE(m.clinical_queries, 0) AS clinical_queries,
    COALESCE(m.medical_queries, 0) AS medical_queries,
    COALESCE(m.site_queries, 0) AS site_queries,
    COALESCE(m.field_monitor_queries, 0) AS field_monitor_queries,
    COALESCE(m.coding_queries, 0) AS coding_queries,
    COALESCE(m.safety_queries, 0) AS safety_queries,
    COALESCE(m.uncoded_terms, 0) AS uncoded_terms,
    COALESCE(m.pages_entered, 0) AS pages_entered,
    COALESCE(m.pages_non_conformant, 0) AS pages_non_conformant,
    COALESCE(m.crfs_require_verification, 0) AS crfs_require_verification,
    COALESCE(m.pds_confirmed, 0) AS pds_confirmed,
    COALESCE(m.pds_proposed, 0) AS pds_proposed,
    COALESCE(m.esae_dashboard_dm, 0) AS sae_dm,
    COALESCE(m.esae_dashboard_safety, 0) AS sae_safety,
    COALESCE(m.crfs_signed, 0) AS crfs_signed,
    COALESCE(m.crfs_overdue_within_45_days, 0) AS crfs_overdue_within_45_days,
    COALESCE(m.crfs_overdue_45_to_90_days, 0) AS crfs_overdue_45_to_90_days,
    COALESCE(m.crfs_overdue_beyond_90_days, 0) AS crfs_overdue_beyond_90_days,
    COALESCE(m.broken_signatures, 0) AS broken_signatures,
    COALESCE(m.crfs_never_signed, 0) AS crfs_never_signed,
    CAST(COALESCE(m.percentage_clean_crf, 0) AS REAL) AS percentage_clean_crf,
    CAST(d.dqi_score AS REAL) AS dqi_score,
    d.dqi_category AS dqi_category,
    d.clean_status AS clean_status
"#;

#[derive(Debug)]
pub(crate) struct SubjectRow {
    study: String,
    region: Option<String>,
    country: Option<String>,
    site_id: String,
    subject_id: String,
    latest_visit: Option<String>,
    subject_status: Option<String>,
    missing_visits: i64,
    missing_pages: i64,
    total_queries: i64,
    dm_queries: i64,
    clinical_queries: i64,
    medical_queries: i64,
    site_queries: i64,
    field_monitor_queries: i64,
    coding_queries: i64,
    safety_queries: i64,
    uncoded_terms: i64,
    pages_entered: i64,
    pages_non_conformant: i64,
    crfs_require_verification: i64,
    pds_confirmed: i64,
    pds_proposed: i64,
    sae_dm: i64,
    sae_safety: i64,
    crfs_signed: i64,
    crfs_overdue_within_45_days: i64,
    crfs_overdue_45_to_90_days: i64,
    crfs_overdue_beyond_90_days: i64,
    broken_signatures: i64,
    crfs_never_signed: i64,
    percentage_clean_crf: f64,
    dqi_score: Option<f64>,
    dqi_category: Option<String>,
    clean_status: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for SubjectRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            study: row.try_get("study")?,
            region: row.try_get("region")?,
            country: row.try_get("country")?,
            site_id: row.try_get("site_id")?,
            subject_id: row.try_get("subject_id")?,
            latest_visit: row.try_get("latest_visit")?,
            subject_status: row.try_get("subject_status")?,
            missing_visits: row.try_get("missing_visits")?,
            missing_pages: row.try_get("missing_pages")?,
            total_queries: row.try_get("total_queries")?,
            dm_queries: row.try_get("dm_queries")?,
            clinical_queries: row.try_get("clinical_queries")?,
            medical_queries: row.try_get("medical_queries")?,
            site_queries: row.try_get("site_queries")?,
            field_monitor_queries: row.try_get("field_monitor_queries")?,
            coding_queries: row.try_get("coding_queries")?,
            safety_queries: row.try_get("safety_queries")?,
            uncoded_terms: row.try_get("uncoded_terms")?,
            pages_entered: row.try_get("pages_entered")?,
            pages_non_conformant: row.try_get("pages_non_conformant")?,
            crfs_require_verification: row.try_get("crfs_require_verification")?,
            pds_confirmed: row.try_get("pds_confirmed")?,
            pds_proposed: row.try_get("pds_proposed")?,
            sae_dm: row.try_get("sae_dm")?,
            sae_safety: row.try_get("sae_safety")?,
            crfs_signed: row.try_get("crfs_signed")?,
            crfs_overdue_within_45_days: row.try_get("crfs_overdue_within_45_days")?,
            crfs_overdue_45_to_90_days: row.try_get("crfs_overdue_45_to_90_days")?,
            crfs_overdue_beyond_90_days: row.try_get("crfs_overdue_beyond_90_days")?,
            broken_signatures: row.try_get("broken_signatures")?,
            crfs_never_signed: row.try_get("crfs_never_signed")?,
            percentage_clean_crf: row.try_get("percentage_clean_crf")?,
            dqi_score: row.try_get("dqi_score")?,
            dqi_category: row.try_get("dqi_category")?,
            clean_status: row.try_get("clean_status")?,
        })
    }
}

impl SubjectRow {
    pub(crate) fn into_metric_row(self) -> SubjectMetricRow {
        let dqi_score = self.dqi_score.map(non_negative_f64);
        let dqi_category = resolve_category(self.dqi_category.as_deref(), dqi_score);
        SubjectMetricRow {
            study: self.study,
            region: self.region,
            country: self.country,
            site_id: self.site_id,
            subject_id: self.subject_id,
            latest_visit: self.latest_visit,
            subject_status: self.subject_status,
            missing_visits: non_negative(self.missing_visits),
            missing_pages: non_negative(self.missing_pages),
            total_queries: non_negative(self.total_queries),
            dm_queries: non_negative(self.dm_queries),
            clinical_queries: non_negative(self.clinical_queries),
            medical_queries: non_negative(self.medical_queries),
            site_queries: non_negative(self.site_queries),
            field_monitor_queries: non_negative(self.field_monitor_queries),
            coding_queries: non_negative(self.coding_queries),
            safety_queries: non_negative(self.safety_queries),
            uncoded_terms: non_negative(self.uncoded_terms),
            pages_entered: non_negative(self.pages_entered),
            pages_non_conformant: non_negative(self.pages_non_conformant),
            crfs_require_verification: non_negative(self.crfs_require_verification),
            pds_confirmed: non_negative(self.pds_confirmed),
            pds_proposed: non_negative(self.pds_proposed),
            sae_dm: non_negative(self.sae_dm),
            sae_safety: non_negative(self.sae_safety),
            crfs_signed: non_negative(self.crfs_signed),
            crfs_overdue_within_45_days: non_negative(self.crfs_overdue_within_45_days),
            crfs_overdue_45_to_90_days: non_negative(self.crfs_overdue_45_to_90_days),
            crfs_overdue_beyond_90_days: non_negative(self.crfs_overdue_beyond_90_days),
            broken_signatures: non_negative(self.broken_signatures),
            crfs_never_signed: non_negative(self.crfs_never_signed),
            percentage_clean_crf: non_negative_f64(self.percentage_clean_crf),
            dqi_score,
            dqi_category,
            clean_status: self.clean_status,
        }
    }
}

/// Row of `subject_dqi_clean_status` for one subject.
#[derive(Debug)]
pub(crate) struct QualityRow {
    dqi_score: f64,
    dqi_category: Option<String>,
    clean_status: Option<String>,
    criteria_met: i64,
    criteria_total: i64,
    failing_criteria: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for QualityRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            dqi_score: row.try_get("dqi_score")?,
            dqi_category: row.try_get("dqi_category")?,
            clean_status: row.try_get("clean_status")?,
            criteria_met: row.try_get("criteria_met")?,
            criteria_total: row.try_get("criteria_total")?,
            failing_criteria: row.try_get("failing_criteria")?,
        })
    }
}

impl QualityRow {
    pub(crate) fn into_quality(self) -> SubjectQuality {
        let dqi_score = non_negative_f64(self.dqi_score);
        SubjectQuality {
            dqi_score,
            dqi_category: resolve_category(self.dqi_category.as_deref(), Some(dqi_score)),
            clean_status: self.clean_status,
            criteria_met: non_negative(self.criteria_met),
            criteria_total: non_negative(self.criteria_total),
            failing_criteria: parse_failing_criteria(self.failing_criteria.as_deref()),
        }
    }
}

/// Stored label wins; a blank or unknown label falls back to the score band.
fn resolve_category(label: Option<&str>, score: Option<f64>) -> Option<DqiCategory> {
    label
        .and_then(DqiCategory::from_label)
        .or_else(|| score.map(DqiCategory::from_score))
}
