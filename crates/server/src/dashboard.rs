//! Assembles the dashboard snapshot for a role and renders it for chat.

use std::fmt::Write as _;
use std::future::Future;

use trial_view_db::{Database, DbResult};
use trial_view_types::{DashboardContext, DashboardRole, DashboardSection, MetricFilters};

use crate::fallback::or_default;

/// Risk sites included in an assembled snapshot.
pub const DASHBOARD_RISK_SITES: u32 = 10;

/// Run `query` only when the role shows `section`.
async fn section<T, F>(
    role: DashboardRole,
    section: DashboardSection,
    operation: &'static str,
    query: F,
) -> T
where
    T: Default,
    F: Future<Output = DbResult<T>>,
{
    if role.includes(section) {
        or_default(operation, query).await
    } else {
        T::default()
    }
}

/// Query every section the role shows, concurrently.
///
/// Never fails: a section whose query errors is left empty and the failure is
/// logged by [`or_default`].
pub async fn assemble_dashboard_context(
    db: &Database,
    filters: &MetricFilters,
    role: DashboardRole,
) -> DashboardContext {
    use DashboardSection as S;

    let (
        kpis,
        queries_by_type,
        queries_by_site,
        query_status,
        query_aging,
        missing_visits_by_site,
        deviations_by_site,
        deviation_status,
        sae_summary,
        signature_compliance,
        dqi_distribution,
        clean_status,
        region_summary,
        risk_sites,
    ) = tokio::join!(
        section(role, S::Kpis, "kpi_summary", db.kpi_summary(filters)),
        section(role, S::QueriesByType, "queries_by_type", db.queries_by_type(filters)),
        section(role, S::QueriesBySite, "queries_by_site", db.queries_by_site(filters)),
        section(role, S::QueryStatus, "query_status_breakdown", db.query_status_breakdown(filters)),
        section(role, S::QueryAging, "query_aging", db.query_aging(filters)),
        section(role, S::MissingVisits, "missing_visits_by_site", db.missing_visits_by_site(filters)),
        section(role, S::DeviationsBySite, "protocol_deviations_by_site", db.protocol_deviations_by_site(filters)),
        section(role, S::DeviationStatus, "protocol_deviation_status", db.protocol_deviation_status(filters)),
        section(role, S::Sae, "sae_summary", db.sae_summary(filters)),
        section(role, S::Signatures, "signature_compliance", db.signature_compliance(filters)),
        section(role, S::Dqi, "dqi_distribution", db.dqi_distribution(filters)),
        section(role, S::CleanStatus, "clean_status_summary", db.clean_status_summary(filters)),
        section(role, S::Regions, "region_summary", db.region_summary(filters)),
        section(role, S::RiskSites, "top_risk_sites", db.top_risk_sites(filters, DASHBOARD_RISK_SITES)),
    );

    DashboardContext {
        filters: filters.clone(),
        role,
        generated_at: chrono::Utc::now().to_rfc3339(),
        kpis,
        queries_by_type,
        queries_by_site,
        query_status,
        query_aging,
        missing_visits_by_site,
        deviations_by_site,
        deviation_status,
        sae_summary,
        signature_compliance,
        dqi_distribution,
        clean_status,
        region_summary,
        risk_sites,
    }
}

/// Plain-text summary of a snapshot, used to ground chat answers.
///
/// Only sections with data are listed, so a role-trimmed snapshot stays short.
pub fn render_briefing(ctx: &DashboardContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dashboard for role {} ({})", ctx.role, ctx.filters);
    let _ = writeln!(out, "Generated at {}", ctx.generated_at);

    let k = &ctx.kpis;
    if ctx.role.includes(DashboardSection::Kpis) {
        let _ = writeln!(
            out,
            "Subjects: {} across {} sites. Open queries: {}. Missing visits: {}. Missing pages: {}.",
            k.total_subjects, k.total_sites, k.open_queries, k.missing_visits, k.missing_pages
        );
        let _ = writeln!(
            out,
            "Protocol deviations: {}. SAE issues: {}. Average DQI: {:.2}. Clean subjects: {} ({:.2}%).",
            k.protocol_deviations, k.sae_issues, k.avg_dqi, k.clean_subjects, k.clean_percentage
        );
    }

    if !ctx.queries_by_type.is_empty() {
        let parts: Vec<String> = ctx
            .queries_by_type
            .iter()
            .map(|q| format!("{} {}", q.query_type, q.count))
            .collect();
        let _ = writeln!(out, "Queries by type: {}.", parts.join(", "));
    }

    if ctx.query_aging.iter().any(|b| b.count > 0) {
        let parts: Vec<String> = ctx
            .query_aging
            .iter()
            .map(|b| format!("{} days: {}", b.bucket, b.count))
            .collect();
        let _ = writeln!(out, "Open query age: {}.", parts.join(", "));
    }

    if !ctx.sae_summary.is_empty() {
        let parts: Vec<String> = ctx
            .sae_summary
            .iter()
            .map(|s| format!("{} / {}: {}", s.responsible, s.review_status, s.count))
            .collect();
        let _ = writeln!(out, "SAE discrepancies: {}.", parts.join(", "));
    }

    if ctx.role.includes(DashboardSection::Signatures) {
        let s = &ctx.signature_compliance;
        let _ = writeln!(
            out,
            "Signatures: {} signed, {} never signed, {} broken, compliance {:.2}%.",
            s.crfs_signed, s.never_signed, s.broken_signatures, s.compliance_rate
        );
    }

    if ctx.dqi_distribution.iter().any(|b| b.subjects > 0) {
        let parts: Vec<String> = ctx
            .dqi_distribution
            .iter()
            .map(|b| format!("{} {}", b.category.label(), b.subjects))
            .collect();
        let _ = writeln!(out, "DQI distribution: {}.", parts.join(", "));
    }

    if !ctx.risk_sites.is_empty() {
        let _ = writeln!(out, "Highest-risk sites:");
        for site in &ctx.risk_sites {
            let _ = writeln!(
                out,
                "- {} ({}): DQI {:.2}, {} open queries, {} subjects",
                site.site_id, site.study, site.avg_dqi, site.open_queries, site.subjects
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trial_view_db::fixtures::SubjectFixture;

    async fn seeded() -> Database {
        let db = Database::new_in_memory().await.unwrap();
        let subject = SubjectFixture {
            dm_queries: 3,
            sae_safety: 1,
            crfs_signed: 4,
            ..SubjectFixture::new("Study 1", "EMEA", "DEU", "Site 101", "SUB-1")
        };
        subject.insert(db.pool()).await.unwrap();
        subject
            .insert_dqi(db.pool(), 72.0, Some("Acceptable"), "Not Clean", 9, None)
            .await
            .unwrap();
        subject
            .insert_sae(db.pool(), "DISC-1", "Safety", "Review Pending", "2025-01-01")
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_study_manager_gets_every_section() {
        let db = seeded().await;
        let ctx = assemble_dashboard_context(&db, &MetricFilters::all(), DashboardRole::StudyManager).await;

        assert_eq!(ctx.kpis.total_subjects, 1);
        assert_eq!(ctx.queries_by_type.len(), 1);
        assert_eq!(ctx.query_aging.len(), 4);
        assert_eq!(ctx.sae_summary.len(), 1);
        assert_eq!(ctx.dqi_distribution.len(), 5);
        assert_eq!(ctx.risk_sites.len(), 1);
        assert_eq!(ctx.region_summary.len(), 1);
        assert!(!ctx.generated_at.is_empty());
    }

    #[tokio::test]
    async fn test_safety_role_leaves_other_sections_empty() {
        let db = seeded().await;
        let ctx = assemble_dashboard_context(&db, &MetricFilters::all(), DashboardRole::Safety).await;

        assert_eq!(ctx.role, DashboardRole::Safety);
        assert_eq!(ctx.kpis.total_subjects, 1);
        assert_eq!(ctx.sae_summary.len(), 1);
        assert!(ctx.queries_by_type.is_empty());
        assert!(ctx.dqi_distribution.is_empty());
        assert!(ctx.risk_sites.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store_still_assembles() {
        let db = seeded().await;
        db.pool().close().await;

        let filters = MetricFilters::all().with_study("Study 1");
        let ctx = assemble_dashboard_context(&db, &filters, DashboardRole::StudyManager).await;
        assert_eq!(ctx.filters, filters);
        assert_eq!(ctx.kpis, Default::default());
        assert!(ctx.queries_by_site.is_empty());
    }

    #[tokio::test]
    async fn test_briefing_mentions_only_populated_sections() {
        let db = seeded().await;
        let ctx = assemble_dashboard_context(&db, &MetricFilters::all(), DashboardRole::Safety).await;
        let text = render_briefing(&ctx);

        assert!(text.contains("role safety"));
        assert!(text.contains("Subjects: 1 across 1 sites"));
        assert!(text.contains("Safety / Review Pending: 1"));
        assert!(!text.contains("Queries by type"));
        assert!(!text.contains("Signatures:"));
    }
}
