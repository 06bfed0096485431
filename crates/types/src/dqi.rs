// crates/types/src/dqi.rs
//! Data Quality Index categories and the clean-patient criteria vocabulary.
//!
//! Scores and criteria are computed by the import pipeline and stored in
//! `subject_dqi_clean_status`; these types only interpret what is stored.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// DQI score band. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(
    feature = "codegen",
    ts(export, export_to = "../../../web/src/types/generated/")
)]
pub enum DqiCategory {
    Excellent,
    Good,
    Acceptable,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    Critical,
}

impl DqiCategory {
    /// All categories in severity order (best first).
    pub const ORDERED: [DqiCategory; 5] = [
        DqiCategory::Excellent,
        DqiCategory::Good,
        DqiCategory::Acceptable,
        DqiCategory::NeedsAttention,
        DqiCategory::Critical,
    ];

    /// Band for a 0-100 score: >=90, >=75, >=60, >=40, else critical.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            DqiCategory::Excellent
        } else if score >= 75.0 {
            DqiCategory::Good
        } else if score >= 60.0 {
            DqiCategory::Acceptable
        } else if score >= 40.0 {
            DqiCategory::NeedsAttention
        } else {
            DqiCategory::Critical
        }
    }

    /// Label as stored in `subject_dqi_clean_status.dqi_category`.
    pub fn label(self) -> &'static str {
        match self {
            DqiCategory::Excellent => "Excellent",
            DqiCategory::Good => "Good",
            DqiCategory::Acceptable => "Acceptable",
            DqiCategory::NeedsAttention => "Needs Attention",
            DqiCategory::Critical => "Critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ORDERED
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Stored clean status label for a fully clean subject.
pub const CLEAN_STATUS_CLEAN: &str = "Clean";

/// One of the eleven clean-patient criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanCriterion {
    NoMissingVisits,
    NoMissingPages,
    NoOpenQueries,
    NoNonConformantData,
    NoUncodedTerms,
    AllFormsVerified,
    AllFormsSigned,
    NoBrokenSignatures,
    NoLabIssues,
    NoEdrrIssues,
    NoSafetyIssues,
}

impl CleanCriterion {
    pub const ALL: [CleanCriterion; 11] = [
        CleanCriterion::NoMissingVisits,
        CleanCriterion::NoMissingPages,
        CleanCriterion::NoOpenQueries,
        CleanCriterion::NoNonConformantData,
        CleanCriterion::NoUncodedTerms,
        CleanCriterion::AllFormsVerified,
        CleanCriterion::AllFormsSigned,
        CleanCriterion::NoBrokenSignatures,
        CleanCriterion::NoLabIssues,
        CleanCriterion::NoEdrrIssues,
        CleanCriterion::NoSafetyIssues,
    ];

    /// Key as written into `failing_criteria`.
    pub fn key(self) -> &'static str {
        match self {
            CleanCriterion::NoMissingVisits => "no_missing_visits",
            CleanCriterion::NoMissingPages => "no_missing_pages",
            CleanCriterion::NoOpenQueries => "no_open_queries",
            CleanCriterion::NoNonConformantData => "no_non_conformant_data",
            CleanCriterion::NoUncodedTerms => "no_uncoded_terms",
            CleanCriterion::AllFormsVerified => "all_forms_verified",
            CleanCriterion::AllFormsSigned => "all_forms_signed",
            CleanCriterion::NoBrokenSignatures => "no_broken_signatures",
            CleanCriterion::NoLabIssues => "no_lab_issues",
            CleanCriterion::NoEdrrIssues => "no_edrr_issues",
            CleanCriterion::NoSafetyIssues => "no_safety_issues",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CleanCriterion::NoMissingVisits => "Missing visits",
            CleanCriterion::NoMissingPages => "Missing pages",
            CleanCriterion::NoOpenQueries => "Open queries",
            CleanCriterion::NoNonConformantData => "Non-conformant data",
            CleanCriterion::NoUncodedTerms => "Uncoded terms",
            CleanCriterion::AllFormsVerified => "Forms awaiting verification",
            CleanCriterion::AllFormsSigned => "Forms never signed",
            CleanCriterion::NoBrokenSignatures => "Broken signatures",
            CleanCriterion::NoLabIssues => "Lab name/range issues",
            CleanCriterion::NoEdrrIssues => "EDRR issues",
            CleanCriterion::NoSafetyIssues => "Open safety issues",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key.trim())
    }
}

/// A criterion a subject currently fails, as shown in Patient 360.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(
    feature = "codegen",
    ts(export, export_to = "../../../web/src/types/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FailingCriterion {
    pub key: String,
    pub label: String,
}

/// Parse the comma-separated `failing_criteria` column.
///
/// Unknown keys are kept with the key as their label.
pub fn parse_failing_criteria(raw: Option<&str>) -> Vec<FailingCriterion> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|key| FailingCriterion {
            key: key.to_string(),
            label: CleanCriterion::from_key(key)
                .map(|c| c.label().to_string())
                .unwrap_or_else(|| key.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(DqiCategory::from_score(100.0), DqiCategory::Excellent);
        assert_eq!(DqiCategory::from_score(90.0), DqiCategory::Excellent);
        assert_eq!(DqiCategory::from_score(89.99), DqiCategory::Good);
        assert_eq!(DqiCategory::from_score(75.0), DqiCategory::Good);
        assert_eq!(DqiCategory::from_score(60.0), DqiCategory::Acceptable);
        assert_eq!(DqiCategory::from_score(40.0), DqiCategory::NeedsAttention);
        assert_eq!(DqiCategory::from_score(39.9), DqiCategory::Critical);
        assert_eq!(DqiCategory::from_score(0.0), DqiCategory::Critical);
    }

    #[test]
    fn test_category_label_round_trip() {
        for cat in DqiCategory::ORDERED {
            assert_eq!(DqiCategory::from_label(cat.label()), Some(cat));
        }
        assert_eq!(
            DqiCategory::from_label("needs attention"),
            Some(DqiCategory::NeedsAttention)
        );
        assert_eq!(DqiCategory::from_label("Superb"), None);
    }

    #[test]
    fn test_category_serializes_with_space() {
        let json = serde_json::to_string(&DqiCategory::NeedsAttention).unwrap();
        assert_eq!(json, "\"Needs Attention\"");
    }

    #[test]
    fn test_parse_failing_criteria() {
        let parsed =
            parse_failing_criteria(Some("no_open_queries, all_forms_signed,mystery_rule"));
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].label, "Open queries");
        assert_eq!(parsed[1].label, "Forms never signed");
        assert_eq!(parsed[2].key, "mystery_rule");
        assert_eq!(parsed[2].label, "mystery_rule");
    }

    #[test]
    fn test_parse_failing_criteria_empty() {
        assert!(parse_failing_criteria(None).is_empty());
        assert!(parse_failing_criteria(Some("")).is_empty());
    }
}
