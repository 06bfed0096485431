// crates/db/src/queries/overview.rs
// Headline KPIs, regional roll-up and the site risk ranking.

use super::{non_negative, non_negative_f64, percent, JOIN_DQI};
use crate::filter::WhereClause;
use crate::{Database, DbResult};
use trial_view_types::{KpiSummary, MetricFilters, RegionSummary, SiteRisk};

/// Upper bound for `top_risk_sites`.
pub const MAX_RISK_SITES: u32 = 100;

impl Database {
    /// KPI tiles over every subject matching `filters`.
    pub async fn kpi_summary(&self, filters: &MetricFilters) -> DbResult<KpiSummary> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                COUNT(*),
                COUNT(DISTINCT m.project_name || '|' || m.site_id),
                COALESCE(SUM(m.total_queries), 0),
                COALESCE(SUM(m.missing_visits), 0),
                COALESCE(SUM(m.missing_page), 0),
                COALESCE(SUM(COALESCE(m.pds_confirmed, 0) + COALESCE(m.pds_proposed, 0)), 0),
                COALESCE(SUM(COALESCE(m.esae_dashboard_dm, 0) + COALESCE(m.esae_dashboard_safety, 0)), 0),
                COALESCE(SUM(m.uncoded_terms), 0),
                COALESCE(SUM(m.crfs_require_verification), 0),
                ROUND(COALESCE(AVG(d.dqi_score), 0.0), 2),
                COALESCE(SUM(CASE WHEN d.clean_status = 'Clean' THEN 1 ELSE 0 END), 0)
            FROM subject_level_metrics m{join}{where_sql}
            "#,
            join = JOIN_DQI,
            where_sql = clause.sql(),
        );

        let row: (i64, i64, i64, i64, i64, i64, i64, i64, i64, f64, i64) = clause
            .bind(sqlx::query_as(&sql))
            .fetch_one(self.pool())
            .await?;

        let total_subjects = non_negative(row.0);
        let clean_subjects = non_negative(row.10);
        Ok(KpiSummary {
            total_subjects,
            total_sites: non_negative(row.1),
            open_queries: non_negative(row.2),
            missing_visits: non_negative(row.3),
            missing_pages: non_negative(row.4),
            protocol_deviations: non_negative(row.5),
            sae_issues: non_negative(row.6),
            uncoded_terms: non_negative(row.7),
            crfs_require_verification: non_negative(row.8),
            avg_dqi: non_negative_f64(row.9),
            clean_subjects,
            clean_percentage: percent(clean_subjects, total_subjects),
        })
    }

    /// Per-region roll-up, ascending by region name.
    pub async fn region_summary(&self, filters: &MetricFilters) -> DbResult<Vec<RegionSummary>> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                COALESCE(NULLIF(TRIM(m.region), ''), 'Unknown') AS region_label,
                COUNT(*),
                COUNT(DISTINCT m.project_name || '|' || m.site_id),
                COALESCE(SUM(m.total_queries), 0),
                ROUND(COALESCE(AVG(d.dqi_score), 0.0), 2)
            FROM subject_level_metrics m{join}{where_sql}
            GROUP BY region_label
            ORDER BY region_label ASC
            "#,
            join = JOIN_DQI,
            where_sql = clause.sql(),
        );

        let rows: Vec<(String, i64, i64, i64, f64)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(region, subjects, sites, open_queries, avg_dqi)| RegionSummary {
                region,
                subjects: non_negative(subjects),
                sites: non_negative(sites),
                open_queries: non_negative(open_queries),
                avg_dqi: non_negative_f64(avg_dqi),
            })
            .collect())
    }

    /// Sites ranked by risk: lowest average DQI first, then most open
    /// queries. Sites with no assessed subject are not ranked.
    pub async fn top_risk_sites(
        &self,
        filters: &MetricFilters,
        limit: u32,
    ) -> DbResult<Vec<SiteRisk>> {
        let limit = limit.clamp(1, MAX_RISK_SITES);
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                m.project_name,
                m.site_id,
                MAX(m.country),
                COUNT(*),
                ROUND(COALESCE(AVG(d.dqi_score), 0.0), 2) AS avg_dqi,
                COALESCE(SUM(m.total_queries), 0) AS open_queries,
                COALESCE(SUM(m.missing_visits), 0),
                COALESCE(SUM(COALESCE(m.esae_dashboard_dm, 0) + COALESCE(m.esae_dashboard_safety, 0)), 0)
            FROM subject_level_metrics m{join}{where_sql}
            GROUP BY m.project_name, m.site_id
            HAVING COUNT(d.dqi_score) > 0
            ORDER BY avg_dqi ASC, open_queries DESC, m.site_id ASC, m.project_name ASC
            LIMIT ?
            "#,
            join = JOIN_DQI,
            where_sql = clause.sql(),
        );

        let rows: Vec<(String, String, Option<String>, i64, f64, i64, i64, i64)> = clause
            .bind(sqlx::query_as(&sql))
            .bind(limit as i64)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(study, site_id, country, subjects, avg_dqi, open_queries, missing, sae)| {
                    SiteRisk {
                        study,
                        site_id,
                        country,
                        subjects: non_negative(subjects),
                        avg_dqi: non_negative_f64(avg_dqi),
                        open_queries: non_negative(open_queries),
                        missing_visits: non_negative(missing),
                        sae_issues: non_negative(sae),
                    }
                },
            )
            .collect())
    }
}
