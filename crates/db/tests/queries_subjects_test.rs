//! Integration tests for the subject table and Patient 360.

use pretty_assertions::assert_eq;
use trial_view_types::{DqiCategory, FailingCriterion, MetricFilters, PageRequest};

mod queries_shared;
use queries_shared::seeded_db;

#[tokio::test]
async fn test_list_subject_metrics_orders_and_paginates() {
    let db = seeded_db().await;

    let page = db
        .list_subject_metrics(&MetricFilters::all(), PageRequest::new(Some(1), Some(4)))
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 4);
    let ids: Vec<&str> = page.rows.iter().map(|r| r.subject_id.as_str()).collect();
    assert_eq!(ids, vec!["SUB-A", "SUB-A2", "SUB-B", "SUB-C"]);

    let page = db
        .list_subject_metrics(&MetricFilters::all(), PageRequest::new(Some(2), Some(4)))
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    let ids: Vec<&str> = page.rows.iter().map(|r| r.subject_id.as_str()).collect();
    assert_eq!(ids, vec!["SUB-D", "SUB-E"]);

    let page = db
        .list_subject_metrics(&MetricFilters::all(), PageRequest::new(Some(9), Some(4)))
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert!(page.rows.is_empty());
}

#[tokio::test]
async fn test_list_subject_metrics_huge_page_is_empty() {
    let db = seeded_db().await;

    let request = PageRequest::new(Some(u64::MAX), Some(PageRequest::MAX_PAGE_SIZE));
    let page = db
        .list_subject_metrics(&MetricFilters::all(), request)
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.page, u64::MAX);
    assert!(page.rows.is_empty());
}

#[tokio::test]
async fn test_list_subject_metrics_row_contents() {
    let db = seeded_db().await;

    let page = db
        .list_subject_metrics(
            &MetricFilters::all().with_subject("SUB-A"),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let row = &page.rows[0];
    assert_eq!(row.study, "Study 1");
    assert_eq!(row.region.as_deref(), Some("EMEA"));
    assert_eq!(row.total_queries, 3);
    assert_eq!(row.dm_queries, 2);
    assert_eq!(row.missing_pages, 2);
    assert_eq!(row.sae_dm, 1);
    assert_eq!(row.percentage_clean_crf, 87.5);
    assert_eq!(row.dqi_score, Some(92.0));
    assert_eq!(row.dqi_category, Some(DqiCategory::Excellent));
    assert_eq!(row.clean_status.as_deref(), Some("Clean"));
}

#[tokio::test]
async fn test_patient_360_populated() {
    let db = seeded_db().await;

    let view = db
        .patient_360(&MetricFilters::all(), "SUB-A")
        .await
        .unwrap()
        .expect("SUB-A exists");

    assert_eq!(view.metrics.subject_id, "SUB-A");
    assert_eq!(view.metrics.latest_visit.as_deref(), Some("Week 24"));

    let quality = view.quality.expect("SUB-A is assessed");
    assert_eq!(quality.dqi_category, Some(DqiCategory::Excellent));
    assert_eq!(quality.criteria_met, 11);
    assert_eq!(quality.criteria_total, 11);
    assert!(quality.failing_criteria.is_empty());

    let visit_dates: Vec<&str> = view
        .recent_visits
        .iter()
        .filter_map(|v| v.visit_date.as_deref())
        .collect();
    assert_eq!(
        visit_dates,
        vec!["2025-06-01", "2025-05-01", "2025-04-01", "2025-03-01", "2025-02-01"]
    );

    assert_eq!(view.overdue_visits.len(), 1);
    assert_eq!(view.overdue_visits[0].days_outstanding, 14);

    let forms: Vec<&str> = view
        .missing_pages
        .iter()
        .filter_map(|p| p.form_name.as_deref())
        .collect();
    assert_eq!(forms, vec!["Form 2", "Form 1"]);

    // Answered query and the orphan's open query are excluded.
    assert_eq!(view.open_queries.len(), 1);
    assert_eq!(view.open_queries[0].marking_group, "DM Review");
    assert_eq!(view.open_queries[0].count, 2);
    assert_eq!(view.open_queries[0].oldest_days_open, 45);

    assert_eq!(view.recent_sae.len(), 1);
    assert_eq!(view.recent_sae[0].discrepancy_id.as_deref(), Some("DISC-A1"));
    assert_eq!(view.recent_sae[0].responsible.as_deref(), Some("DM"));

    assert_eq!(view.protocol_deviations.len(), 1);
    assert_eq!(view.protocol_deviations[0].status.as_deref(), Some("Confirmed"));

    let pending: Vec<u64> = view.pending_signatures.iter().map(|s| s.days_pending).collect();
    assert_eq!(pending, vec![50, 20]);
}

#[tokio::test]
async fn test_patient_360_sae_newest_first() {
    let db = seeded_db().await;

    let view = db
        .patient_360(&MetricFilters::all(), "SUB-B")
        .await
        .unwrap()
        .unwrap();
    let ids: Vec<&str> = view
        .recent_sae
        .iter()
        .filter_map(|s| s.discrepancy_id.as_deref())
        .collect();
    assert_eq!(ids, vec!["DISC-B2", "DISC-B1"]);
    assert_eq!(view.open_queries[0].marking_group, "CRA");
}

#[tokio::test]
async fn test_patient_360_failing_criteria_parsed() {
    let db = seeded_db().await;

    let view = db
        .patient_360(&MetricFilters::all(), "SUB-E")
        .await
        .unwrap()
        .unwrap();
    let quality = view.quality.unwrap();
    assert_eq!(
        quality.failing_criteria,
        vec![
            FailingCriterion {
                key: "no_open_queries".into(),
                label: "Open queries".into(),
            },
            FailingCriterion {
                key: "unknown_rule".into(),
                label: "unknown_rule".into(),
            },
        ]
    );
}

#[tokio::test]
async fn test_patient_360_zero_counters_is_not_missing() {
    let db = seeded_db().await;

    let view = db
        .patient_360(&MetricFilters::all(), "SUB-D")
        .await
        .unwrap()
        .expect("a subject with all-zero counters is still found");

    assert_eq!(view.metrics.total_queries, 0);
    assert_eq!(view.metrics.missing_visits, 0);
    assert_eq!(view.metrics.dqi_score, None);
    assert!(view.quality.is_none());
    assert!(view.recent_visits.is_empty());
    assert!(view.open_queries.is_empty());
    assert!(view.pending_signatures.is_empty());
}

#[tokio::test]
async fn test_patient_360_not_found() {
    let db = seeded_db().await;

    // Child records exist for SUB-GHOST, but no metrics row.
    let view = db.patient_360(&MetricFilters::all(), "SUB-GHOST").await.unwrap();
    assert!(view.is_none());

    let view = db.patient_360(&MetricFilters::all(), "NOPE").await.unwrap();
    assert!(view.is_none());
}

#[tokio::test]
async fn test_patient_360_respects_active_filters() {
    let db = seeded_db().await;

    let view = db
        .patient_360(&MetricFilters::all().with_study("Study 2"), "SUB-A")
        .await
        .unwrap();
    assert!(view.is_none(), "SUB-A is not in Study 2");

    let view = db
        .patient_360(&MetricFilters::all().with_study("Study 1"), "SUB-A")
        .await
        .unwrap();
    assert!(view.is_some());
}
