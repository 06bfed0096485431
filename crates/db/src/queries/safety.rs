// crates/db/src/queries/safety.rs

use super::{label_or_unknown, non_negative};
use crate::filter::{exists_metrics_by_subject, WhereClause};
use crate::{Database, DbResult};
use trial_view_types::{MetricFilters, SaeStatusCount};

impl Database {
    /// SAE discrepancies by responsible function and review status.
    pub async fn sae_summary(&self, filters: &MetricFilters) -> DbResult<Vec<SaeStatusCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                {responsible} AS responsible_label,
                {review} AS review_label,
                COUNT(*) AS sae_count
            FROM sae_issues s{exists}
            GROUP BY responsible_label, review_label
            ORDER BY responsible_label ASC, sae_count DESC, review_label ASC
            "#,
            responsible = label_or_unknown("s.responsible_lf"),
            review = label_or_unknown("s.review_status"),
            exists = exists_metrics_by_subject("s", &clause),
        );

        let rows: Vec<(String, String, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(responsible, review_status, count)| SaeStatusCount {
                responsible,
                review_status,
                count: non_negative(count),
            })
            .collect())
    }
}
