// crates/db/src/fixtures.rs
//! Builders for populating a metrics store in tests and demo databases.
//!
//! The production store is written by the external import pipeline; these
//! helpers insert rows with the same shape so queries can be exercised
//! without it.

use sqlx::SqliteExecutor;
use tracing::info;
use trial_view_types::DqiCategory;

use crate::{Database, DbResult};

/// One `subject_level_metrics` row. Counters default to zero.
///
/// `total_queries` is written as the sum of the seven per-type counters.
#[derive(Debug, Clone, Default)]
pub struct SubjectFixture {
    pub study: String,
    pub region: Option<String>,
    pub country: Option<String>,
    pub site_id: String,
    pub subject_id: String,
    pub latest_visit: Option<String>,
    pub subject_status: Option<String>,
    pub missing_visits: i64,
    pub missing_pages: i64,
    pub uncoded_terms: i64,
    pub pages_entered: i64,
    pub pages_non_conformant: i64,
    pub percentage_clean_crf: f64,
    pub dm_queries: i64,
    pub clinical_queries: i64,
    pub medical_queries: i64,
    pub site_queries: i64,
    pub field_monitor_queries: i64,
    pub coding_queries: i64,
    pub safety_queries: i64,
    pub crfs_require_verification: i64,
    pub pds_confirmed: i64,
    pub pds_proposed: i64,
    pub sae_dm: i64,
    pub sae_safety: i64,
    pub crfs_signed: i64,
    pub crfs_overdue_within_45_days: i64,
    pub crfs_overdue_45_to_90_days: i64,
    pub crfs_overdue_beyond_90_days: i64,
    pub broken_signatures: i64,
    pub crfs_never_signed: i64,
}

impl SubjectFixture {
    pub fn new(study: &str, region: &str, country: &str, site_id: &str, subject_id: &str) -> Self {
        Self {
            study: study.to_string(),
            region: Some(region.to_string()),
            country: Some(country.to_string()),
            site_id: site_id.to_string(),
            subject_id: subject_id.to_string(),
            subject_status: Some("Enrolled".to_string()),
            ..Default::default()
        }
    }

    pub fn total_queries(&self) -> i64 {
        self.dm_queries
            + self.clinical_queries
            + self.medical_queries
            + self.site_queries
            + self.field_monitor_queries
            + self.coding_queries
            + self.safety_queries
    }

    pub async fn insert<'c, E: SqliteExecutor<'c>>(&self, exec: E) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subject_level_metrics (
                project_name, region, country, site_id, subject_id,
                latest_visit, subject_status, missing_visits, missing_page,
                uncoded_terms, pages_entered, pages_non_conformant, percentage_clean_crf,
                dm_queries, clinical_queries, medical_queries, site_queries,
                field_monitor_queries, coding_queries, safety_queries, total_queries,
                crfs_require_verification, pds_confirmed, pds_proposed,
                esae_dashboard_dm, esae_dashboard_safety, crfs_signed,
                crfs_overdue_within_45_days, crfs_overdue_45_to_90_days,
                crfs_overdue_beyond_90_days, broken_signatures, crfs_never_signed
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            )
            "#,
        )
        .bind(&self.study)
        .bind(&self.region)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(&self.latest_visit)
        .bind(&self.subject_status)
        .bind(self.missing_visits)
        .bind(self.missing_pages)
        .bind(self.uncoded_terms)
        .bind(self.pages_entered)
        .bind(self.pages_non_conformant)
        .bind(self.percentage_clean_crf)
        .bind(self.dm_queries)
        .bind(self.clinical_queries)
        .bind(self.medical_queries)
        .bind(self.site_queries)
        .bind(self.field_monitor_queries)
        .bind(self.coding_queries)
        .bind(self.safety_queries)
        .bind(self.total_queries())
        .bind(self.crfs_require_verification)
        .bind(self.pds_confirmed)
        .bind(self.pds_proposed)
        .bind(self.sae_dm)
        .bind(self.sae_safety)
        .bind(self.crfs_signed)
        .bind(self.crfs_overdue_within_45_days)
        .bind(self.crfs_overdue_45_to_90_days)
        .bind(self.crfs_overdue_beyond_90_days)
        .bind(self.broken_signatures)
        .bind(self.crfs_never_signed)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// DQI/clean-status row. `category: None` leaves the label blank.
    pub async fn insert_dqi<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        score: f64,
        category: Option<&str>,
        clean_status: &str,
        criteria_met: i64,
        failing_criteria: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subject_dqi_clean_status (
                project_name, site_id, subject_id, dqi_score, dqi_category,
                clean_status, criteria_met, criteria_total, failing_criteria
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 11, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(score)
        .bind(category)
        .bind(clean_status)
        .bind(criteria_met)
        .bind(failing_criteria)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_query<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        status: Option<&str>,
        marking_group: Option<&str>,
        days_since_open: Option<i64>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO query_report (
                project_name, region, country, site_id, subject_id,
                visit_name, form_name, query_status, marking_group_name, days_since_open
            ) VALUES (?, ?, ?, ?, ?, 'Screening', 'Demographics', ?, ?, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.region)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(status)
        .bind(marking_group)
        .bind(days_since_open)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_completed_visit<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        visit_name: &str,
        visit_date: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO completed_visits (
                project_name, region, country, site_id, subject_id, visit_name, visit_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.region)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(visit_name)
        .bind(visit_date)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_missing_visit<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        visit_name: &str,
        projected_date: &str,
        days_outstanding: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO missing_visits (
                project_name, country, site_id, subject_id, visit_name,
                projected_date, days_outstanding
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(visit_name)
        .bind(projected_date)
        .bind(days_outstanding)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_missing_page<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        visit_name: &str,
        form_name: &str,
        days_missing: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO missing_pages (
                project_name, page_type, country, site_id, subject_id,
                visit_name, form_name, days_missing
            ) VALUES (?, 'CRF', ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(visit_name)
        .bind(form_name)
        .bind(days_missing)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_sae<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        discrepancy_id: &str,
        responsible: &str,
        review_status: &str,
        created_at: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sae_issues (
                discrepancy_id, project_name, country, site_id, subject_id, form_name,
                case_status, discrepancy_created_timestamp, review_status,
                action_status, responsible_lf
            ) VALUES (?, ?, ?, ?, ?, 'SAE Report', 'Open', ?, ?, 'Pending', ?)
            "#,
        )
        .bind(discrepancy_id)
        .bind(&self.study)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(created_at)
        .bind(review_status)
        .bind(responsible)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_deviation<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        visit_name: &str,
        status: &str,
        visit_date: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO protocol_deviation (
                project_name, region, country, site_id, subject_id,
                visit_name, form_name, pd_status, visit_date
            ) VALUES (?, ?, ?, ?, ?, ?, 'Protocol Deviation', ?, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.region)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(visit_name)
        .bind(status)
        .bind(visit_date)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_pending_signature<'c, E: SqliteExecutor<'c>>(
        &self,
        exec: E,
        visit_name: &str,
        form_name: &str,
        days_pending: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pi_signature_report (
                project_name, region, country, site_id, subject_id,
                visit_name, form_name, page_require_signature, no_of_days, pending_since
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'Yes', ?, ?)
            "#,
        )
        .bind(&self.study)
        .bind(&self.region)
        .bind(&self.country)
        .bind(&self.site_id)
        .bind(&self.subject_id)
        .bind(visit_name)
        .bind(form_name)
        .bind(days_pending)
        .bind(format!("{} days", days_pending))
        .execute(exec)
        .await?;
        Ok(())
    }
}

/// (study, region, country, site) layout of the demo dataset.
const DEMO_SITES: [(&str, &str, &str, &str); 6] = [
    ("Study 1", "EMEA", "DEU", "Site 101"),
    ("Study 1", "EMEA", "FRA", "Site 102"),
    ("Study 1", "NA", "USA", "Site 103"),
    ("Study 2", "NA", "USA", "Site 201"),
    ("Study 2", "APAC", "JPN", "Site 202"),
    ("Study 2", "APAC", "AUS", "Site 203"),
];

const DEMO_SUBJECTS_PER_SITE: usize = 8;

/// Populate a writable store with a small deterministic dataset.
///
/// Returns the number of subjects inserted. Intended for an empty store;
/// running it twice fails on the subject uniqueness constraint.
pub async fn seed_demo(db: &Database) -> DbResult<usize> {
    let mut tx = db.pool().begin().await?;
    let mut inserted = 0usize;

    for (site_idx, (study, region, country, site)) in DEMO_SITES.iter().enumerate() {
        for n in 0..DEMO_SUBJECTS_PER_SITE {
            let seed = (site_idx * DEMO_SUBJECTS_PER_SITE + n) as i64;
            let subject_id = format!("{}-{:03}", site.replace("Site ", "SUB"), n + 1);
            let subject = SubjectFixture {
                latest_visit: Some(format!("Week {}", 2 + seed % 10)),
                missing_visits: seed % 3,
                missing_pages: (seed * 7) % 4,
                uncoded_terms: seed % 2,
                pages_entered: 20 + seed % 15,
                pages_non_conformant: seed % 5 / 3,
                percentage_clean_crf: (60 + (seed * 13) % 41) as f64,
                dm_queries: seed % 4,
                clinical_queries: (seed * 3) % 3,
                medical_queries: seed % 2,
                site_queries: (seed * 5) % 3,
                field_monitor_queries: seed % 3 / 2,
                coding_queries: seed % 2,
                safety_queries: seed % 5 / 4,
                crfs_require_verification: (seed * 11) % 6,
                pds_confirmed: seed % 7 / 5,
                pds_proposed: seed % 4 / 3,
                sae_dm: seed % 9 / 8,
                sae_safety: seed % 6 / 5,
                crfs_signed: 10 + seed % 12,
                crfs_overdue_within_45_days: seed % 3,
                crfs_overdue_45_to_90_days: seed % 5 / 4,
                crfs_overdue_beyond_90_days: seed % 11 / 10,
                broken_signatures: seed % 13 / 12,
                crfs_never_signed: seed % 4 / 3,
                ..SubjectFixture::new(study, region, country, site, &subject_id)
            };
            subject.insert(&mut *tx).await?;

            let score = (35 + (seed * 17) % 65) as f64;
            let clean = subject.total_queries() == 0 && subject.missing_visits == 0;
            let failing = if clean {
                None
            } else {
                Some("no_open_queries,no_missing_visits")
            };
            subject
                .insert_dqi(
                    &mut *tx,
                    score,
                    Some(DqiCategory::from_score(score).label()),
                    if clean { "Clean" } else { "Not Clean" },
                    if clean { 11 } else { 9 },
                    failing,
                )
                .await?;

            for v in 0..(1 + seed % 4) {
                subject
                    .insert_completed_visit(
                        &mut *tx,
                        &format!("Week {}", v * 2),
                        &format!("2025-{:02}-{:02}", 1 + v, 1 + seed % 27),
                    )
                    .await?;
            }
            for q in 0..subject.total_queries() {
                let (status, group) = match q % 3 {
                    0 => ("Open", "DM Review"),
                    1 => ("Answered", "Site Review"),
                    _ => ("Open", "CRA"),
                };
                subject
                    .insert_query(&mut *tx, Some(status), Some(group), Some((seed * 9 + q * 17) % 90))
                    .await?;
            }
            for v in 0..subject.missing_visits {
                subject
                    .insert_missing_visit(
                        &mut *tx,
                        &format!("Week {}", 12 + v * 4),
                        "2025-06-01",
                        5 + (seed + v) % 40,
                    )
                    .await?;
            }
            for p in 0..subject.missing_pages {
                subject
                    .insert_missing_page(&mut *tx, "Week 4", &format!("Form {}", p + 1), 3 + p * 9)
                    .await?;
            }
            for d in 0..(subject.pds_confirmed + subject.pds_proposed) {
                let status = if d < subject.pds_confirmed {
                    "Confirmed"
                } else {
                    "Proposed"
                };
                subject
                    .insert_deviation(&mut *tx, "Week 2", status, "2025-02-14")
                    .await?;
            }
            if subject.sae_dm + subject.sae_safety > 0 {
                let responsible = if subject.sae_dm > 0 { "DM" } else { "Safety" };
                subject
                    .insert_sae(
                        &mut *tx,
                        &format!("SAE-{:04}", seed),
                        responsible,
                        "Review Pending",
                        "2025-03-10 09:30:00",
                    )
                    .await?;
            }
            if subject.crfs_overdue_within_45_days > 0 {
                subject
                    .insert_pending_signature(&mut *tx, "Week 4", "Vital Signs", 10 + seed % 30)
                    .await?;
            }
            inserted += 1;
        }
    }

    tx.commit().await?;
    info!(subjects = inserted, "Seeded demo metrics store");
    Ok(inserted)
}
