//! Integration tests for KPI, region and risk-site queries.

use pretty_assertions::assert_eq;
use trial_view_types::{KpiSummary, MetricFilters, RegionSummary};

mod queries_shared;
use queries_shared::seeded_db;

#[tokio::test]
async fn test_kpi_summary_unfiltered() {
    let db = seeded_db().await;

    let kpis = db.kpi_summary(&MetricFilters::all()).await.unwrap();
    assert_eq!(
        kpis,
        KpiSummary {
            total_subjects: 6,
            total_sites: 5,
            open_queries: 12,
            missing_visits: 4,
            missing_pages: 3,
            protocol_deviations: 5,
            sae_issues: 4,
            uncoded_terms: 1,
            crfs_require_verification: 2,
            avg_dqi: 65.4,
            clean_subjects: 2,
            clean_percentage: 33.33,
        }
    );
}

#[tokio::test]
async fn test_kpi_summary_by_region() {
    let db = seeded_db().await;

    let kpis = db
        .kpi_summary(&MetricFilters::all().with_region("EMEA"))
        .await
        .unwrap();
    assert_eq!(kpis.total_subjects, 3);
    assert_eq!(kpis.total_sites, 2);
    assert_eq!(kpis.open_queries, 9);
    assert_eq!(kpis.avg_dqi, 75.67);
    assert_eq!(kpis.clean_percentage, 66.67);
}

#[tokio::test]
async fn test_kpi_summary_inconsistent_filters_are_silently_empty() {
    let db = seeded_db().await;

    // Site 202 belongs to Study 2.
    let filters = MetricFilters::all().with_study("Study 1").with_site("Site 202");
    let kpis = db.kpi_summary(&filters).await.unwrap();
    assert_eq!(kpis, KpiSummary::default());
}

#[tokio::test]
async fn test_region_summary_sorted_by_name() {
    let db = seeded_db().await;

    let regions = db.region_summary(&MetricFilters::all()).await.unwrap();
    assert_eq!(
        regions,
        vec![
            RegionSummary {
                region: "APAC".into(),
                subjects: 1,
                sites: 1,
                open_queries: 2,
                avg_dqi: 30.0,
            },
            RegionSummary {
                region: "EMEA".into(),
                subjects: 3,
                sites: 2,
                open_queries: 9,
                avg_dqi: 75.67,
            },
            RegionSummary {
                region: "NA".into(),
                subjects: 2,
                sites: 2,
                open_queries: 1,
                avg_dqi: 70.0,
            },
        ]
    );
}

#[tokio::test]
async fn test_top_risk_sites_orders_lowest_dqi_first() {
    let db = seeded_db().await;

    let sites = db.top_risk_sites(&MetricFilters::all(), 10).await.unwrap();
    let order: Vec<&str> = sites.iter().map(|s| s.site_id.as_str()).collect();
    // Site 201 has no assessed subject and is not ranked.
    assert_eq!(order, vec!["Site 202", "Site 102", "Site 103", "Site 101"]);

    let worst = &sites[0];
    assert_eq!(worst.study, "Study 2");
    assert_eq!(worst.country.as_deref(), Some("JPN"));
    assert_eq!(worst.avg_dqi, 30.0);
    assert_eq!(worst.open_queries, 2);
    assert_eq!(worst.sae_issues, 1);

    let best = &sites[3];
    assert_eq!(best.subjects, 2);
    assert_eq!(best.avg_dqi, 86.0);
    assert_eq!(best.open_queries, 5);
}

#[tokio::test]
async fn test_top_risk_sites_respects_limit() {
    let db = seeded_db().await;

    let sites = db.top_risk_sites(&MetricFilters::all(), 2).await.unwrap();
    assert_eq!(sites.len(), 2);

    // Zero is clamped up to one.
    let sites = db.top_risk_sites(&MetricFilters::all(), 0).await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].site_id, "Site 202");
}
