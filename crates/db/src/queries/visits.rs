// crates/db/src/queries/visits.rs

use super::non_negative;
use crate::filter::WhereClause;
use crate::{Database, DbResult};
use trial_view_types::{MetricFilters, SiteMissingCount};

impl Database {
    /// Missing visits and pages per site, for sites with anything missing.
    ///
    /// Ordered by missing visits descending, then site.
    pub async fn missing_visits_by_site(
        &self,
        filters: &MetricFilters,
    ) -> DbResult<Vec<SiteMissingCount>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                m.project_name,
                m.site_id,
                COALESCE(SUM(m.missing_visits), 0) AS site_visits,
                COALESCE(SUM(m.missing_page), 0) AS site_pages
            FROM subject_level_metrics m{}
            GROUP BY m.project_name, m.site_id
            HAVING site_visits > 0 OR site_pages > 0
            ORDER BY site_visits DESC, m.site_id ASC, m.project_name ASC
            "#,
            clause.sql()
        );

        let rows: Vec<(String, String, i64, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(study, site_id, visits, pages)| SiteMissingCount {
                study,
                site_id,
                missing_visits: non_negative(visits),
                missing_pages: non_negative(pages),
            })
            .collect())
    }
}
