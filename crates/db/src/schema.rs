/// DDL for the metrics store.
///
/// The import pipeline owns this schema; the statements are mirrored here so
/// that tests and development databases can be created. Every statement is
/// idempotent (`IF NOT EXISTS`), so applying them to a populated store is safe.

pub const STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS subject_level_metrics (
    project_name TEXT NOT NULL,
    region TEXT,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    latest_visit TEXT,
    subject_status TEXT,
    missing_visits INTEGER DEFAULT 0,
    missing_page INTEGER DEFAULT 0,
    coded_terms INTEGER DEFAULT 0,
    uncoded_terms INTEGER DEFAULT 0,
    open_issues_in_lnr INTEGER DEFAULT 0,
    open_issues_edrr INTEGER DEFAULT 0,
    inactivated_forms_folders INTEGER DEFAULT 0,
    esae_dashboard_dm INTEGER DEFAULT 0,
    esae_dashboard_safety INTEGER DEFAULT 0,
    expected_visits INTEGER DEFAULT 0,
    pages_entered INTEGER DEFAULT 0,
    pages_non_conformant INTEGER DEFAULT 0,
    crfs_with_queries_nc INTEGER DEFAULT 0,
    crfs_without_queries_nc INTEGER DEFAULT 0,
    percentage_clean_crf REAL DEFAULT 0.0,
    dm_queries INTEGER DEFAULT 0,
    clinical_queries INTEGER DEFAULT 0,
    medical_queries INTEGER DEFAULT 0,
    site_queries INTEGER DEFAULT 0,
    field_monitor_queries INTEGER DEFAULT 0,
    coding_queries INTEGER DEFAULT 0,
    safety_queries INTEGER DEFAULT 0,
    total_queries INTEGER DEFAULT 0,
    crfs_require_verification INTEGER DEFAULT 0,
    forms_verified INTEGER DEFAULT 0,
    crfs_frozen INTEGER DEFAULT 0,
    crfs_not_frozen INTEGER DEFAULT 0,
    crfs_locked INTEGER DEFAULT 0,
    crfs_unlocked INTEGER DEFAULT 0,
    pds_confirmed INTEGER DEFAULT 0,
    pds_proposed INTEGER DEFAULT 0,
    crfs_signed INTEGER DEFAULT 0,
    crfs_overdue_within_45_days INTEGER DEFAULT 0,
    crfs_overdue_45_to_90_days INTEGER DEFAULT 0,
    crfs_overdue_beyond_90_days INTEGER DEFAULT 0,
    broken_signatures INTEGER DEFAULT 0,
    crfs_never_signed INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(project_name, site_id, subject_id)
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS query_report (
    project_name TEXT NOT NULL,
    region TEXT,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    visit_name TEXT,
    form_name TEXT,
    field_oid TEXT,
    logline TEXT,
    visit_date DATE,
    query_status TEXT,
    action_owner TEXT,
    marking_group_name TEXT,
    query_open_date DATE,
    query_response_date DATE,
    days_since_open INTEGER,
    days_since_response INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS pi_signature_report (
    project_name TEXT NOT NULL,
    region TEXT,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    visit_name TEXT,
    form_name TEXT,
    page_require_signature TEXT,
    audit_action TEXT,
    visit_date DATE,
    date_page_entered DATE,
    no_of_days INTEGER,
    pending_since TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS protocol_deviation (
    project_name TEXT NOT NULL,
    region TEXT,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    visit_name TEXT,
    form_name TEXT,
    logline TEXT,
    pd_status TEXT,
    visit_date DATE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS completed_visits (
    project_name TEXT NOT NULL,
    region TEXT,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    visit_name TEXT,
    visit_date DATE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS sae_issues (
    discrepancy_id TEXT,
    project_name TEXT NOT NULL,
    country TEXT,
    site_id TEXT,
    subject_id TEXT NOT NULL,
    form_name TEXT,
    case_status TEXT,
    discrepancy_created_timestamp TEXT,
    review_status TEXT,
    action_status TEXT,
    responsible_lf TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS missing_pages (
    project_name TEXT NOT NULL,
    page_type TEXT,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    visit_name TEXT,
    form_name TEXT,
    visit_date DATE,
    subject_status TEXT,
    days_missing INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS missing_visits (
    project_name TEXT NOT NULL,
    country TEXT,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    visit_name TEXT,
    projected_date DATE,
    days_outstanding INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS subject_dqi_clean_status (
    project_name TEXT NOT NULL,
    site_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    dqi_score REAL DEFAULT 0.0,
    dqi_category TEXT,
    norm_safety_issues REAL DEFAULT 0.0,
    norm_open_queries REAL DEFAULT 0.0,
    norm_missing_visits REAL DEFAULT 0.0,
    norm_missing_pages REAL DEFAULT 0.0,
    norm_non_conformant REAL DEFAULT 0.0,
    norm_unsigned_crfs REAL DEFAULT 0.0,
    norm_unverified_forms REAL DEFAULT 0.0,
    norm_uncoded_terms REAL DEFAULT 0.0,
    norm_protocol_deviations REAL DEFAULT 0.0,
    clean_status TEXT,
    criteria_met INTEGER DEFAULT 0,
    criteria_total INTEGER DEFAULT 11,
    failing_criteria TEXT,
    calculated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(project_name, site_id, subject_id)
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_slm_project_site_subject ON subject_level_metrics(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_qr_project_site_subject ON query_report(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_qr_query_status ON query_report(query_status);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_pd_project_site_subject ON protocol_deviation(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_cv_project_site_subject ON completed_visits(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sae_project_subject ON sae_issues(project_name, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_mp_project_site_subject ON missing_pages(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_mv_project_site_subject ON missing_visits(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_dqi_project_site_subject ON subject_dqi_clean_status(project_name, site_id, subject_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_dqi_category ON subject_dqi_clean_status(dqi_category);"#,
];

/// Tables the query layer reads, for diagnostics.
pub const TABLES: &[&str] = &[
    "subject_level_metrics",
    "query_report",
    "pi_signature_report",
    "protocol_deviation",
    "completed_visits",
    "sae_issues",
    "missing_pages",
    "missing_visits",
    "subject_dqi_clean_status",
];
