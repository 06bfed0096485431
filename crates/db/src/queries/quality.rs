// crates/db/src/queries/quality.rs
// DQI distribution and clean-patient status. Scores are read, never computed.

use super::{non_negative, non_negative_f64, percent, JOIN_DQI};
use crate::filter::{join_metrics, WhereClause};
use crate::{Database, DbResult};
use trial_view_types::{CleanStatusSummary, DqiBucket, DqiCategory, MetricFilters};

/// Stored category, falling back to the score band when the label is blank.
const CATEGORY_EXPR: &str = "COALESCE(NULLIF(TRIM(d.dqi_category), ''), \
     CASE WHEN d.dqi_score >= 90 THEN 'Excellent' \
          WHEN d.dqi_score >= 75 THEN 'Good' \
          WHEN d.dqi_score >= 60 THEN 'Acceptable' \
          WHEN d.dqi_score >= 40 THEN 'Needs Attention' \
          ELSE 'Critical' END)";

impl Database {
    /// Assessed subjects per DQI category, every category present, best
    /// category first.
    pub async fn dqi_distribution(&self, filters: &MetricFilters) -> DbResult<Vec<DqiBucket>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                {category} AS category_label,
                COUNT(*),
                TOTAL(d.dqi_score)
            FROM subject_dqi_clean_status d{join}{where_sql}
            GROUP BY category_label
            "#,
            category = CATEGORY_EXPR,
            join = join_metrics("d"),
            where_sql = clause.sql(),
        );

        let rows: Vec<(String, i64, f64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        // Labels that differ only in case fold into the same category.
        let mut totals = [(0u64, 0.0f64); 5];
        for (label, subjects, score_sum) in rows {
            let Some(category) = DqiCategory::from_label(&label) else {
                tracing::warn!(label = %label, "Skipping unrecognised DQI category");
                continue;
            };
            let slot = &mut totals[category as usize];
            slot.0 += non_negative(subjects);
            slot.1 += non_negative_f64(score_sum);
        }

        Ok(DqiCategory::ORDERED
            .into_iter()
            .zip(totals)
            .map(|(category, (subjects, score_sum))| DqiBucket {
                category,
                subjects,
                avg_score: if subjects == 0 {
                    0.0
                } else {
                    super::round2(score_sum / subjects as f64)
                },
            })
            .collect())
    }

    /// Clean / not clean / not yet assessed split.
    ///
    /// The clean percentage is over assessed subjects only.
    pub async fn clean_status_summary(
        &self,
        filters: &MetricFilters,
    ) -> DbResult<CleanStatusSummary> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN d.clean_status = 'Clean' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN d.subject_id IS NOT NULL
                                   AND COALESCE(d.clean_status, '') != 'Clean' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN d.subject_id IS NULL THEN 1 ELSE 0 END), 0),
                ROUND(COALESCE(AVG(d.criteria_met), 0.0), 2)
            FROM subject_level_metrics m{join}{where_sql}
            "#,
            join = JOIN_DQI,
            where_sql = clause.sql(),
        );

        let row: (i64, i64, i64, f64) = clause
            .bind(sqlx::query_as(&sql))
            .fetch_one(self.pool())
            .await?;

        let clean = non_negative(row.0);
        let not_clean = non_negative(row.1);
        Ok(CleanStatusSummary {
            clean,
            not_clean,
            not_assessed: non_negative(row.2),
            clean_percentage: percent(clean, clean + not_clean),
            avg_criteria_met: non_negative_f64(row.3),
        })
    }
}
