// crates/types/src/context.rs
//! The assembled dashboard snapshot and the roles that shape it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::filters::MetricFilters;
use crate::metrics::{
    AgingBucket, CleanStatusSummary, DqiBucket, KpiSummary, QueryTypeCount, RegionSummary,
    SaeStatusCount, SignatureCompliance, SiteDeviationCount, SiteMissingCount, SiteQueryCount,
    SiteRisk, StatusCount,
};

/// Which audience the dashboard is assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum DashboardRole {
    #[default]
    StudyManager,
    Cra,
    DataManager,
    Safety,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown dashboard role: {0}")]
pub struct UnknownRole(pub String);

impl DashboardRole {
    pub fn as_str(self) -> &'static str {
        match self {
            DashboardRole::StudyManager => "study_manager",
            DashboardRole::Cra => "cra",
            DashboardRole::DataManager => "data_manager",
            DashboardRole::Safety => "safety",
        }
    }

    /// Sections rendered for this role.
    pub fn sections(self) -> &'static [DashboardSection] {
        use DashboardSection::*;
        match self {
            DashboardRole::StudyManager => &DashboardSection::ALL,
            DashboardRole::Cra => &[
                Kpis,
                QueriesBySite,
                MissingVisits,
                DeviationsBySite,
                Signatures,
                RiskSites,
            ],
            DashboardRole::DataManager => &[
                Kpis,
                QueriesByType,
                QueryStatus,
                QueryAging,
                Dqi,
                CleanStatus,
            ],
            DashboardRole::Safety => &[Kpis, Sae, DeviationStatus, DeviationsBySite],
        }
    }

    pub fn includes(self, section: DashboardSection) -> bool {
        self.sections().contains(&section)
    }
}

impl FromStr for DashboardRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "study_manager" | "manager" => Ok(DashboardRole::StudyManager),
            "cra" => Ok(DashboardRole::Cra),
            "data_manager" | "dm" => Ok(DashboardRole::DataManager),
            "safety" => Ok(DashboardRole::Safety),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for DashboardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chart or table on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardSection {
    Kpis,
    QueriesByType,
    QueriesBySite,
    QueryStatus,
    QueryAging,
    MissingVisits,
    DeviationsBySite,
    DeviationStatus,
    Sae,
    Signatures,
    Dqi,
    CleanStatus,
    Regions,
    RiskSites,
}

impl DashboardSection {
    pub const ALL: [DashboardSection; 14] = [
        DashboardSection::Kpis,
        DashboardSection::QueriesByType,
        DashboardSection::QueriesBySite,
        DashboardSection::QueryStatus,
        DashboardSection::QueryAging,
        DashboardSection::MissingVisits,
        DashboardSection::DeviationsBySite,
        DashboardSection::DeviationStatus,
        DashboardSection::Sae,
        DashboardSection::Signatures,
        DashboardSection::Dqi,
        DashboardSection::CleanStatus,
        DashboardSection::Regions,
        DashboardSection::RiskSites,
    ];
}

/// Snapshot of what a user currently sees: active filters plus chart data.
///
/// Sections outside the role are left at their empty default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct DashboardContext {
    pub filters: MetricFilters,
    pub role: DashboardRole,
    /// RFC 3339 timestamp of assembly.
    pub generated_at: String,
    pub kpis: KpiSummary,
    pub queries_by_type: Vec<QueryTypeCount>,
    pub queries_by_site: Vec<SiteQueryCount>,
    pub query_status: Vec<StatusCount>,
    pub query_aging: Vec<AgingBucket>,
    pub missing_visits_by_site: Vec<SiteMissingCount>,
    pub deviations_by_site: Vec<SiteDeviationCount>,
    pub deviation_status: Vec<StatusCount>,
    pub sae_summary: Vec<SaeStatusCount>,
    pub signature_compliance: SignatureCompliance,
    pub dqi_distribution: Vec<DqiBucket>,
    pub clean_status: CleanStatusSummary,
    pub region_summary: Vec<RegionSummary>,
    pub risk_sites: Vec<SiteRisk>,
}
