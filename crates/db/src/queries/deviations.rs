// crates/db/src/queries/deviations.rs
// Protocol deviation charts.

use super::{label_or_unknown, non_negative};
use crate::filter::{join_metrics, WhereClause};
use crate::{Database, DbResult};
use trial_view_types::{MetricFilters, SiteDeviationCount, StatusCount};

impl Database {
    /// Confirmed and proposed deviations per site, largest total first.
    /// Sites without deviations are omitted.
    pub async fn protocol_deviations_by_site(
        &self,
        filters: &MetricFilters,
    ) -> DbResult<Vec<SiteDeviationCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                m.project_name,
                m.site_id,
                COALESCE(SUM(m.pds_confirmed), 0) AS confirmed,
                COALESCE(SUM(m.pds_proposed), 0) AS proposed
            FROM subject_level_metrics m{}
            GROUP BY m.project_name, m.site_id
            HAVING confirmed + proposed > 0
            ORDER BY confirmed + proposed DESC, m.site_id ASC, m.project_name ASC
            "#,
            clause.sql()
        );

        let rows: Vec<(String, String, i64, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(study, site_id, confirmed, proposed)| {
                let confirmed = non_negative(confirmed);
                let proposed = non_negative(proposed);
                SiteDeviationCount {
                    study,
                    site_id,
                    confirmed,
                    proposed,
                    total: confirmed + proposed,
                }
            })
            .collect())
    }

    /// Deviation records per status, most frequent first.
    pub async fn protocol_deviation_status(
        &self,
        filters: &MetricFilters,
    ) -> DbResult<Vec<StatusCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT {status} AS status_label, COUNT(*) AS status_count
            FROM protocol_deviation p{join}{where_sql}
            GROUP BY status_label
            ORDER BY status_count DESC, status_label ASC
            "#,
            status = label_or_unknown("p.pd_status"),
            join = join_metrics("p"),
            where_sql = clause.sql(),
        );

        let rows: Vec<(String, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount {
                status,
                count: non_negative(count),
            })
            .collect())
    }
}
