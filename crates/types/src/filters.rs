// crates/types/src/filters.rs
//! The five-dimension filter tuple shared by every dashboard query.
//!
//! Each dimension is either a concrete value or unconstrained. The UI sends
//! the literal `"ALL"` for "no constraint"; an absent or blank parameter means
//! the same thing. Normalization happens here, once, so the query layer only
//! ever sees `None` or a concrete trimmed value.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Sentinel the UI uses for "apply no constraint on this dimension".
pub const ALL: &str = "ALL";

/// One filter dimension, in hierarchy order (study narrows region, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Study,
    Region,
    Country,
    Site,
    Subject,
}

impl FilterDimension {
    /// Every dimension in hierarchy order.
    pub const ALL: [FilterDimension; 5] = [
        FilterDimension::Study,
        FilterDimension::Region,
        FilterDimension::Country,
        FilterDimension::Site,
        FilterDimension::Subject,
    ];

    /// Column holding this dimension in the metrics store.
    pub fn column(self) -> &'static str {
        match self {
            FilterDimension::Study => "project_name",
            FilterDimension::Region => "region",
            FilterDimension::Country => "country",
            FilterDimension::Site => "site_id",
            FilterDimension::Subject => "subject_id",
        }
    }

    /// Query-string parameter name.
    pub fn param(self) -> &'static str {
        match self {
            FilterDimension::Study => "study",
            FilterDimension::Region => "region",
            FilterDimension::Country => "country",
            FilterDimension::Site => "siteId",
            FilterDimension::Subject => "subjectId",
        }
    }
}

/// Normalize a raw filter value: `"ALL"` and blank mean unconstrained.
///
/// The sentinel is case-sensitive; `"All"` is a concrete value.
pub fn normalize_filter_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ALL {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Conjunctive filter tuple. `None` means unconstrained.
///
/// Deserializes from query strings (`study`, `region`, `country`, `siteId`,
/// `subjectId`; snake_case aliases accepted). Serializes unconstrained
/// dimensions back as `"ALL"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(
    feature = "codegen",
    ts(export, export_to = "../../../web/src/types/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MetricFilters {
    #[serde(default, with = "sentinel")]
    #[ts(type = "string")]
    pub study: Option<String>,
    #[serde(default, with = "sentinel")]
    #[ts(type = "string")]
    pub region: Option<String>,
    #[serde(default, with = "sentinel")]
    #[ts(type = "string")]
    pub country: Option<String>,
    #[serde(default, alias = "site_id", with = "sentinel")]
    #[ts(type = "string")]
    pub site_id: Option<String>,
    #[serde(default, alias = "subject_id", with = "sentinel")]
    #[ts(type = "string")]
    pub subject_id: Option<String>,
}

impl MetricFilters {
    /// The unconstrained tuple.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn get(&self, dim: FilterDimension) -> Option<&str> {
        match dim {
            FilterDimension::Study => self.study.as_deref(),
            FilterDimension::Region => self.region.as_deref(),
            FilterDimension::Country => self.country.as_deref(),
            FilterDimension::Site => self.site_id.as_deref(),
            FilterDimension::Subject => self.subject_id.as_deref(),
        }
    }

    /// Set one dimension, applying sentinel normalization.
    pub fn set(&mut self, dim: FilterDimension, raw: &str) {
        let value = normalize_filter_value(raw);
        match dim {
            FilterDimension::Study => self.study = value,
            FilterDimension::Region => self.region = value,
            FilterDimension::Country => self.country = value,
            FilterDimension::Site => self.site_id = value,
            FilterDimension::Subject => self.subject_id = value,
        }
    }

    /// Builder form of [`MetricFilters::set`].
    pub fn with(mut self, dim: FilterDimension, raw: &str) -> Self {
        self.set(dim, raw);
        self
    }

    pub fn with_study(self, raw: &str) -> Self {
        self.with(FilterDimension::Study, raw)
    }

    pub fn with_region(self, raw: &str) -> Self {
        self.with(FilterDimension::Region, raw)
    }

    pub fn with_country(self, raw: &str) -> Self {
        self.with(FilterDimension::Country, raw)
    }

    pub fn with_site(self, raw: &str) -> Self {
        self.with(FilterDimension::Site, raw)
    }

    pub fn with_subject(self, raw: &str) -> Self {
        self.with(FilterDimension::Subject, raw)
    }

    /// Constrained dimensions with their values, in hierarchy order.
    pub fn constrained(&self) -> Vec<(FilterDimension, &str)> {
        FilterDimension::ALL
            .iter()
            .filter_map(|dim| self.get(*dim).map(|v| (*dim, v)))
            .collect()
    }

    pub fn is_unconstrained(&self) -> bool {
        FilterDimension::ALL.iter().all(|dim| self.get(*dim).is_none())
    }

    /// Keep only the dimensions strictly above `dim` in the hierarchy.
    ///
    /// Dropdown lists are scoped by their ancestors only, so picking a site
    /// does not collapse the site list to that one entry.
    pub fn scoped_above(&self, dim: FilterDimension) -> Self {
        let mut scoped = Self::default();
        for ancestor in FilterDimension::ALL.iter().take_while(|d| **d != dim) {
            if let Some(value) = self.get(*ancestor) {
                scoped.set(*ancestor, value);
            }
        }
        scoped
    }
}

impl fmt::Display for MetricFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = FilterDimension::ALL
            .iter()
            .map(|dim| format!("{}={}", dim.param(), self.get(*dim).unwrap_or(ALL)))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// serde adapter: `"ALL"` / blank / missing <-> `None`.
mod sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{normalize_filter_value, ALL};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(ALL))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(normalize_filter_value))
    }
}
