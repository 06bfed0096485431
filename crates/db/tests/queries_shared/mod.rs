//! Shared dataset for the query integration tests.
//!
//! Six subjects over two studies, three regions and five sites:
//!
//! | subject | study   | region | country | site     | queries | DQI            |
//! |---------|---------|--------|---------|----------|---------|----------------|
//! | SUB-A   | Study 1 | EMEA   | DEU     | Site 101 | 3       | 92 Excellent   |
//! | SUB-A2  | Study 1 | EMEA   | DEU     | Site 101 | 2       | 80 Good        |
//! | SUB-B   | Study 1 | EMEA   | FRA     | Site 102 | 4       | 55 Needs Att.  |
//! | SUB-C   | Study 1 | NA     | USA     | Site 103 | 1       | 70 (no label)  |
//! | SUB-D   | Study 2 | NA     | USA     | Site 201 | 0       | not assessed   |
//! | SUB-E   | Study 2 | APAC   | JPN     | Site 202 | 2       | 30 Critical    |
//!
//! Plus child records for an orphan subject (`SUB-GHOST`) that has no
//! metrics row and must never be counted.
#![allow(dead_code)]

use trial_view_db::fixtures::SubjectFixture;
use trial_view_db::Database;

pub fn subject_a() -> SubjectFixture {
    SubjectFixture {
        dm_queries: 2,
        clinical_queries: 1,
        missing_visits: 1,
        missing_pages: 2,
        pds_confirmed: 1,
        sae_dm: 1,
        uncoded_terms: 1,
        crfs_require_verification: 2,
        crfs_signed: 10,
        crfs_overdue_within_45_days: 2,
        crfs_never_signed: 1,
        percentage_clean_crf: 87.5,
        latest_visit: Some("Week 24".to_string()),
        ..SubjectFixture::new("Study 1", "EMEA", "DEU", "Site 101", "SUB-A")
    }
}

pub fn subject_a2() -> SubjectFixture {
    SubjectFixture {
        clinical_queries: 2,
        ..SubjectFixture::new("Study 1", "EMEA", "DEU", "Site 101", "SUB-A2")
    }
}

pub fn subject_b() -> SubjectFixture {
    SubjectFixture {
        medical_queries: 4,
        missing_pages: 1,
        pds_proposed: 2,
        sae_safety: 2,
        crfs_signed: 5,
        crfs_overdue_45_to_90_days: 1,
        broken_signatures: 1,
        ..SubjectFixture::new("Study 1", "EMEA", "FRA", "Site 102", "SUB-B")
    }
}

pub fn subject_c() -> SubjectFixture {
    SubjectFixture {
        site_queries: 1,
        missing_visits: 2,
        ..SubjectFixture::new("Study 1", "NA", "USA", "Site 103", "SUB-C")
    }
}

/// Exists with every counter at zero and no DQI row.
pub fn subject_d() -> SubjectFixture {
    SubjectFixture::new("Study 2", "NA", "USA", "Site 201", "SUB-D")
}

pub fn subject_e() -> SubjectFixture {
    SubjectFixture {
        dm_queries: 1,
        safety_queries: 1,
        missing_visits: 1,
        pds_confirmed: 1,
        pds_proposed: 1,
        sae_safety: 1,
        crfs_signed: 8,
        crfs_overdue_beyond_90_days: 1,
        ..SubjectFixture::new("Study 2", "APAC", "JPN", "Site 202", "SUB-E")
    }
}

/// Never inserted into `subject_level_metrics`.
pub fn ghost() -> SubjectFixture {
    SubjectFixture::new("Study 1", "EMEA", "DEU", "Site 101", "SUB-GHOST")
}

/// In-memory store holding the dataset described in the module docs.
pub async fn seeded_db() -> Database {
    let db = Database::new_in_memory().await.unwrap();
    let pool = db.pool();

    let (a, a2, b, c, d, e) = (
        subject_a(),
        subject_a2(),
        subject_b(),
        subject_c(),
        subject_d(),
        subject_e(),
    );
    for subject in [&a, &a2, &b, &c, &d, &e] {
        subject.insert(pool).await.unwrap();
    }

    a.insert_dqi(pool, 92.0, Some("Excellent"), "Clean", 11, None)
        .await
        .unwrap();
    a2.insert_dqi(pool, 80.0, Some("Good"), "Clean", 11, None)
        .await
        .unwrap();
    b.insert_dqi(
        pool,
        55.0,
        Some("Needs Attention"),
        "Not Clean",
        8,
        Some("no_open_queries,no_missing_pages"),
    )
    .await
    .unwrap();
    c.insert_dqi(pool, 70.0, None, "Not Clean", 10, Some("no_missing_visits"))
        .await
        .unwrap();
    e.insert_dqi(
        pool,
        30.0,
        Some("Critical"),
        "Not Clean",
        6,
        Some("no_open_queries, unknown_rule"),
    )
    .await
    .unwrap();

    // Query records: 4 open, 1 answered, 1 closed, 1 without status.
    a.insert_query(pool, Some("Open"), Some("DM Review"), Some(3)).await.unwrap();
    a.insert_query(pool, Some("Open"), Some("DM Review"), Some(45)).await.unwrap();
    a.insert_query(pool, Some("Answered"), Some("Site Review"), Some(10)).await.unwrap();
    b.insert_query(pool, Some("Open"), Some("CRA"), Some(70)).await.unwrap();
    b.insert_query(pool, Some("Closed"), None, Some(100)).await.unwrap();
    b.insert_query(pool, None, None, Some(5)).await.unwrap();
    e.insert_query(pool, Some("Open"), Some("CRA"), None).await.unwrap();
    ghost().insert_query(pool, Some("Open"), Some("DM Review"), Some(200)).await.unwrap();

    // Completed visits for SUB-A: six, so Patient 360 truncates to five.
    for month in 1..=6 {
        a.insert_completed_visit(pool, &format!("Visit {}", month), &format!("2025-{:02}-01", month))
            .await
            .unwrap();
    }

    a.insert_missing_visit(pool, "Week 12", "2025-07-01", 14).await.unwrap();
    a.insert_missing_page(pool, "Week 4", "Form 1", 3).await.unwrap();
    a.insert_missing_page(pool, "Week 8", "Form 2", 12).await.unwrap();

    a.insert_deviation(pool, "Week 2", "Confirmed", "2025-02-14").await.unwrap();
    b.insert_deviation(pool, "Week 2", "Proposed", "2025-02-10").await.unwrap();
    b.insert_deviation(pool, "Week 6", "Proposed", "2025-03-10").await.unwrap();
    e.insert_deviation(pool, "Week 4", "Confirmed", "2025-04-01").await.unwrap();
    e.insert_deviation(pool, "Week 8", "Proposed", "2025-05-01").await.unwrap();
    ghost().insert_deviation(pool, "Week 2", "Confirmed", "2025-02-14").await.unwrap();

    a.insert_sae(pool, "DISC-A1", "DM", "Review Pending", "2025-03-01 10:00:00")
        .await
        .unwrap();
    b.insert_sae(pool, "DISC-B1", "Safety", "Review Pending", "2025-01-05 08:00:00")
        .await
        .unwrap();
    b.insert_sae(pool, "DISC-B2", "Safety", "Review Pending", "2025-02-01 08:00:00")
        .await
        .unwrap();
    e.insert_sae(pool, "DISC-E1", "Safety", "Reviewed", "2025-04-20 12:00:00")
        .await
        .unwrap();
    ghost().insert_sae(pool, "DISC-G1", "DM", "Reviewed", "2025-04-20 12:00:00")
        .await
        .unwrap();

    a.insert_pending_signature(pool, "Week 4", "Vital Signs", 20).await.unwrap();
    a.insert_pending_signature(pool, "Week 8", "Adverse Events", 50).await.unwrap();

    db
}
