// crates/db/src/queries/subjects.rs
// Subject metrics table and the single-subject Patient 360 view.

use super::row_types::{QualityRow, SubjectRow, SUBJECT_COLUMNS};
use super::{label_or_unknown, non_negative, JOIN_DQI};
use crate::filter::WhereClause;
use crate::{Database, DbResult};
use trial_view_types::{
    DeviationRecord, MetricFilters, MissingPage, OpenQueryGroup, OverdueVisit, PageRequest,
    Patient360, PendingSignature, SaeRecord, SubjectMetricsPage, SubjectQuality, VisitRecord,
};

/// How many completed visits and SAE records Patient 360 shows.
pub const RECENT_LIMIT: i64 = 5;

/// Identity of one subject's metrics row.
struct SubjectKey {
    study: String,
    site_id: String,
    subject_id: String,
}

impl SubjectKey {
    /// Predicate on `alias` matching this subject exactly.
    fn clause(&self, alias: &str) -> WhereClause {
        WhereClause::build(&MetricFilters::all(), alias)
            .and_eq(&format!("{}.project_name", alias), &self.study)
            .and_eq(&format!("{}.site_id", alias), &self.site_id)
            .and_eq(&format!("{}.subject_id", alias), &self.subject_id)
    }

    /// Study and subject only, for tables with an unreliable site column.
    fn clause_by_subject(&self, alias: &str) -> WhereClause {
        WhereClause::build(&MetricFilters::all(), alias)
            .and_eq(&format!("{}.project_name", alias), &self.study)
            .and_eq(&format!("{}.subject_id", alias), &self.subject_id)
    }
}

impl Database {
    /// One page of subject metric rows, ordered by study, site, subject.
    pub async fn list_subject_metrics(
        &self,
        filters: &MetricFilters,
        page: PageRequest,
    ) -> DbResult<SubjectMetricsPage> {
        let clause = WhereClause::for_metrics(filters);

        let count_sql = format!("SELECT COUNT(*) FROM subject_level_metrics m{}", clause.sql());
        let (total,): (i64,) = clause
            .bind(sqlx::query_as(&count_sql))
            .fetch_one(self.pool())
            .await?;

        let select_sql = format!(
            r#"
            SELECT {columns}
            FROM subject_level_metrics m{join}{where_sql}
            ORDER BY m.project_name ASC, m.site_id ASC, m.subject_id ASC
            LIMIT ? OFFSET ?
            "#,
            columns = SUBJECT_COLUMNS,
            join = JOIN_DQI,
            where_sql = clause.sql(),
        );
        let rows: Vec<SubjectRow> = clause
            .bind(sqlx::query_as(&select_sql))
            .bind(page.page_size as i64)
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(self.pool())
            .await?;

        Ok(SubjectMetricsPage {
            rows: rows.into_iter().map(SubjectRow::into_metric_row).collect(),
            total: non_negative(total),
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// Everything known about one subject.
    ///
    /// Returns `Ok(None)` when no metrics row matches `subject_id` under the
    /// active filters. A subject that exists with all-zero counters still
    /// returns a populated view. When a subject id appears in several
    /// studies or sites, the first by study then site wins.
    pub async fn patient_360(
        &self,
        filters: &MetricFilters,
        subject_id: &str,
    ) -> DbResult<Option<Patient360>> {
        let clause = WhereClause::for_metrics(filters).and_eq("m.subject_id", subject_id.trim());
        let sql = format!(
            r#"
            SELECT {columns}
            FROM subject_level_metrics m{join}{where_sql}
            ORDER BY m.project_name ASC, m.site_id ASC
            LIMIT 1
            "#,
            columns = SUBJECT_COLUMNS,
            join = JOIN_DQI,
            where_sql = clause.sql(),
        );
        let Some(row) = clause
            .bind(sqlx::query_as::<_, SubjectRow>(&sql))
            .fetch_optional(self.pool())
            .await?
        else {
            return Ok(None);
        };

        let metrics = row.into_metric_row();
        let key = SubjectKey {
            study: metrics.study.clone(),
            site_id: metrics.site_id.clone(),
            subject_id: metrics.subject_id.clone(),
        };

        let (
            quality,
            recent_visits,
            overdue_visits,
            missing_pages,
            open_queries,
            recent_sae,
            protocol_deviations,
            pending_signatures,
        ) = tokio::try_join!(
            self.subject_quality(&key),
            self.subject_recent_visits(&key),
            self.subject_overdue_visits(&key),
            self.subject_missing_pages(&key),
            self.subject_open_queries(&key),
            self.subject_recent_sae(&key),
            self.subject_deviations(&key),
            self.subject_pending_signatures(&key),
        )?;

        Ok(Some(Patient360 {
            metrics,
            quality,
            recent_visits,
            overdue_visits,
            missing_pages,
            open_queries,
            recent_sae,
            protocol_deviations,
            pending_signatures,
        }))
    }

    async fn subject_quality(&self, key: &SubjectKey) -> DbResult<Option<SubjectQuality>> {
        let clause = key.clause("d");
        let sql = format!(
            r#"
            SELECT
                CAST(COALESCE(d.dqi_score, 0) AS REAL) AS dqi_score,
                d.dqi_category AS dqi_category,
                d.clean_status AS clean_status,
                COALESCE(d.criteria_met, 0) AS criteria_met,
                COALESCE(d.criteria_total, 11) AS criteria_total,
                d.failing_criteria AS failing_criteria
            FROM subject_dqi_clean_status d{}
            "#,
            clause.sql()
        );
        let row: Option<QualityRow> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(QualityRow::into_quality))
    }

    /// Last completed visits, newest first.
    async fn subject_recent_visits(&self, key: &SubjectKey) -> DbResult<Vec<VisitRecord>> {
        let clause = key.clause("c");
        let sql = format!(
            r#"
            SELECT c.visit_name, CAST(c.visit_date AS TEXT) AS visit_day
            FROM completed_visits c{}
            ORDER BY visit_day DESC, c.visit_name ASC
            LIMIT ?
            "#,
            clause.sql()
        );
        let rows: Vec<(Option<String>, Option<String>)> = clause
            .bind(sqlx::query_as(&sql))
            .bind(RECENT_LIMIT)
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(visit_name, visit_date)| VisitRecord {
                visit_name,
                visit_date,
            })
            .collect())
    }

    /// Outstanding visits, longest outstanding first.
    async fn subject_overdue_visits(&self, key: &SubjectKey) -> DbResult<Vec<OverdueVisit>> {
        let clause = key.clause("v");
        let sql = format!(
            r#"
            SELECT
                v.visit_name,
                CAST(v.projected_date AS TEXT),
                COALESCE(v.days_outstanding, 0) AS days
            FROM missing_visits v{}
            ORDER BY days DESC, v.visit_name ASC
            "#,
            clause.sql()
        );
        let rows: Vec<(Option<String>, Option<String>, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(visit_name, projected_date, days)| OverdueVisit {
                visit_name,
                projected_date,
                days_outstanding: non_negative(days),
            })
            .collect())
    }

    async fn subject_missing_pages(&self, key: &SubjectKey) -> DbResult<Vec<MissingPage>> {
        let clause = key.clause("p");
        let sql = format!(
            r#"
            SELECT p.page_type, p.visit_name, p.form_name, COALESCE(p.days_missing, 0) AS days
            FROM missing_pages p{}
            ORDER BY days DESC, p.form_name ASC
            "#,
            clause.sql()
        );
        let rows: Vec<(Option<String>, Option<String>, Option<String>, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(page_type, visit_name, form_name, days)| MissingPage {
                page_type,
                visit_name,
                form_name,
                days_missing: non_negative(days),
            })
            .collect())
    }

    /// Open queries grouped by marking group, largest group first.
    async fn subject_open_queries(&self, key: &SubjectKey) -> DbResult<Vec<OpenQueryGroup>> {
        let clause = key
            .clause("q")
            .and("LOWER(TRIM(q.query_status)) = 'open'");
        let sql = format!(
            r#"
            SELECT
                {group} AS group_label,
                COUNT(*) AS group_count,
                COALESCE(MAX(q.days_since_open), 0)
            FROM query_report q{where_sql}
            GROUP BY group_label
            ORDER BY group_count DESC, group_label ASC
            "#,
            group = label_or_unknown("q.marking_group_name"),
            where_sql = clause.sql(),
        );
        let rows: Vec<(String, i64, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(marking_group, count, oldest)| OpenQueryGroup {
                marking_group,
                count: non_negative(count),
                oldest_days_open: non_negative(oldest),
            })
            .collect())
    }

    /// Latest SAE discrepancies, newest first.
    async fn subject_recent_sae(&self, key: &SubjectKey) -> DbResult<Vec<SaeRecord>> {
        let clause = key.clause_by_subject("s");
        let sql = format!(
            r#"
            SELECT
                s.discrepancy_id,
                s.form_name,
                s.case_status,
                s.review_status,
                s.action_status,
                s.responsible_lf,
                s.discrepancy_created_timestamp
            FROM sae_issues s{}
            ORDER BY s.discrepancy_created_timestamp DESC, s.discrepancy_id ASC
            LIMIT ?
            "#,
            clause.sql()
        );
        let rows: Vec<(
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        )> = clause
            .bind(sqlx::query_as(&sql))
            .bind(RECENT_LIMIT)
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(
                |(discrepancy_id, form_name, case_status, review_status, action_status, responsible, created_at)| {
                    SaeRecord {
                        discrepancy_id,
                        form_name,
                        case_status,
                        review_status,
                        action_status,
                        responsible,
                        created_at,
                    }
                },
            )
            .collect())
    }

    async fn subject_deviations(&self, key: &SubjectKey) -> DbResult<Vec<DeviationRecord>> {
        let clause = key.clause("p");
        let sql = format!(
            r#"
            SELECT p.visit_name, p.form_name, p.pd_status, CAST(p.visit_date AS TEXT) AS visit_day
            FROM protocol_deviation p{}
            ORDER BY visit_day DESC, p.visit_name ASC
            "#,
            clause.sql()
        );
        let rows: Vec<(Option<String>, Option<String>, Option<String>, Option<String>)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(visit_name, form_name, status, visit_date)| DeviationRecord {
                visit_name,
                form_name,
                status,
                visit_date,
            })
            .collect())
    }

    /// Forms awaiting PI signature, longest pending first.
    async fn subject_pending_signatures(
        &self,
        key: &SubjectKey,
    ) -> DbResult<Vec<PendingSignature>> {
        let clause = key.clause("g");
        let sql = format!(
            r#"
            SELECT g.visit_name, g.form_name, COALESCE(g.no_of_days, 0) AS days, g.pending_since
            FROM pi_signature_report g{}
            ORDER BY days DESC, g.form_name ASC
            "#,
            clause.sql()
        );
        let rows: Vec<(Option<String>, Option<String>, i64, Option<String>)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(visit_name, form_name, days, pending_since)| PendingSignature {
                visit_name,
                form_name,
                days_pending: non_negative(days),
                pending_since,
            })
            .collect())
    }
}
