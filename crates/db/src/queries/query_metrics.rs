// crates/db/src/queries/query_metrics.rs
// Data-query charts: by type, by site, by status and by age.

use super::{label_or_unknown, non_negative};
use crate::filter::{join_metrics, WhereClause};
use crate::{Database, DbResult};
use trial_view_types::{AgingBucket, MetricFilters, QueryTypeCount, SiteQueryCount, StatusCount};

/// Display name and counter column for each query type.
const QUERY_TYPES: [(&str, &str); 7] = [
    ("DM", "dm_queries"),
    ("Clinical", "clinical_queries"),
    ("Medical", "medical_queries"),
    ("Site", "site_queries"),
    ("Field Monitor", "field_monitor_queries"),
    ("Coding", "coding_queries"),
    ("Safety", "safety_queries"),
];

/// Aging bucket labels, in display order.
pub const AGING_BUCKETS: [&str; 4] = ["0-7", "8-30", "31-60", ">60"];

impl Database {
    /// Query counts per type. Types with no queries are omitted.
    ///
    /// Ordered by count descending, then type name.
    pub async fn queries_by_type(&self, filters: &MetricFilters) -> DbResult<Vec<QueryTypeCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sums: Vec<String> = QUERY_TYPES
            .iter()
            .map(|(_, column)| format!("COALESCE(SUM(m.{}), 0)", column))
            .collect();
        let sql = format!(
            "SELECT {} FROM subject_level_metrics m{}",
            sums.join(", "),
            clause.sql()
        );

        let row: (i64, i64, i64, i64, i64, i64, i64) = clause
            .bind(sqlx::query_as(&sql))
            .fetch_one(self.pool())
            .await?;
        let counts = [row.0, row.1, row.2, row.3, row.4, row.5, row.6];

        let mut result: Vec<QueryTypeCount> = QUERY_TYPES
            .iter()
            .zip(counts)
            .map(|((name, _), count)| QueryTypeCount {
                query_type: name.to_string(),
                count: non_negative(count),
            })
            .filter(|q| q.count > 0)
            .collect();
        result.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.query_type.cmp(&b.query_type))
        });
        Ok(result)
    }

    /// Total queries per (study, site), most queries first.
    pub async fn queries_by_site(&self, filters: &MetricFilters) -> DbResult<Vec<SiteQueryCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                m.project_name,
                m.site_id,
                COALESCE(SUM(m.total_queries), 0) AS site_total,
                COUNT(*)
            FROM subject_level_metrics m{}
            GROUP BY m.project_name, m.site_id
            ORDER BY site_total DESC, m.site_id ASC, m.project_name ASC
            "#,
            clause.sql()
        );

        let rows: Vec<(String, String, i64, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(study, site_id, total, subjects)| SiteQueryCount {
                study,
                site_id,
                total_queries: non_negative(total),
                subjects: non_negative(subjects),
            })
            .collect())
    }

    /// Query records per status. A missing status is reported as `Unknown`.
    pub async fn query_status_breakdown(
        &self,
        filters: &MetricFilters,
    ) -> DbResult<Vec<StatusCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT {status} AS status_label, COUNT(*) AS status_count
            FROM query_report q{join}{where_sql}
            GROUP BY status_label
            ORDER BY status_count DESC, status_label ASC
            "#,
            status = label_or_unknown("q.query_status"),
            join = join_metrics("q"),
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

    /// Open queries bucketed by days since opening.
    ///
    /// Always returns the four buckets in order. Queries with no recorded age
    /// count as freshly opened.
    pub async fn query_aging(&self, filters: &MetricFilters) -> DbResult<Vec<AgingBucket>> {
        let clause = WhereClause::for_metrics(filters).and("LOWER(TRIM(q.query_status)) = 'open'");
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN COALESCE(q.days_since_open, 0) <= 7 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN q.days_since_open BETWEEN 8 AND 30 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN q.days_since_open BETWEEN 31 AND 60 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN q.days_since_open > 60 THEN 1 ELSE 0 END), 0)
            FROM query_report q{join}{where_sql}
            "#,
            join = join_metrics("q"),
            where_sql = clause.sql(),
        );

        let row: (i64, i64, i64, i64) = clause
            .bind(sqlx::query_as(&sql))
            .fetch_one(self.pool())
            .await?;

        Ok(AGING_BUCKETS
            .iter()
            .zip([row.0, row.1, row.2, row.3])
            .map(|(bucket, count)| AgingBucket {
                bucket: bucket.to_string(),
                count: non_negative(count),
            })
            .collect())
    }
}
