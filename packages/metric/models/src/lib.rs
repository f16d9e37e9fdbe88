#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric definition, raw value, flat record and period types.
//!
//! These types are shared by the catalog, the fetchers, the comparator and
//! the presentation layer. A [`FlatRecord`] is the unit of data exchanged
//! between them: one code → value map per ZIP code and period.

pub mod period;
pub mod record;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use period::{InvalidPeriodError, Period};
pub use record::{FlatRecord, RawValue};

/// Which upstream dataset family a metric comes from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricSource {
    /// American Community Survey 5-year estimates
    Acs,
    /// ZIP Code Business Patterns
    Zbp,
}

/// Table section a metric is displayed under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricCategory {
    /// Housing and residential investment
    Housing,
    /// Business and employment
    BusinessEmployment,
    /// Metrics defined without a category
    #[default]
    General,
}

impl MetricCategory {
    /// Returns the section heading shown above this category's rows.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Housing => "Housing & Residential Investment",
            Self::BusinessEmployment => "Business & Employment",
            Self::General => "Other Statistics",
        }
    }

    /// Returns all variants in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Housing, Self::BusinessEmployment, Self::General]
    }
}

/// ACS table family. The upstream cannot mix families in one request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dataset {
    /// Detailed tables (`B*` codes)
    Detailed,
    /// Data profiles (`DP*` codes)
    Profile,
}

impl Dataset {
    /// Returns the dataset path below `/data/{year}/`.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Detailed => "acs/acs5",
            Self::Profile => "acs/acs5/profile",
        }
    }

    /// Infers the dataset from a metric code prefix.
    #[must_use]
    pub fn for_code(code: &str) -> Self {
        if code.starts_with("DP") {
            Self::Profile
        } else {
            Self::Detailed
        }
    }
}

/// Which subset of the catalog to fetch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MetricSelection {
    /// Every metric in the catalog
    #[default]
    All,
    /// Only metrics flagged `core`
    Core,
}

/// A single statistic the dashboard can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    /// Opaque upstream field identifier (e.g. `"DP04_0001E"`).
    pub code: String,
    /// Human-readable label.
    pub label: String,
    /// Table section. Uncategorised metrics fall into
    /// [`MetricCategory::General`], listed last.
    #[serde(default)]
    pub category: MetricCategory,
    /// Upstream dataset family.
    pub source: MetricSource,
    /// Whether this metric belongs to the reduced, more reliable subset.
    #[serde(default)]
    pub core: bool,
    /// Explicit ACS table family. Inferred from the code when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Dataset>,
}

impl MetricDefinition {
    /// Returns the ACS table family this metric is requested from.
    #[must_use]
    pub fn dataset(&self) -> Dataset {
        self.dataset.unwrap_or_else(|| Dataset::for_code(&self.code))
    }

    /// Returns `true` if this metric is included by `selection`.
    #[must_use]
    pub const fn is_selected(&self, selection: MetricSelection) -> bool {
        match selection {
            MetricSelection::All => true,
            MetricSelection::Core => self.core,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_dataset_from_prefix() {
        assert_eq!(Dataset::for_code("DP04_0001E"), Dataset::Profile);
        assert_eq!(Dataset::for_code("DP03_0009PE"), Dataset::Profile);
        assert_eq!(Dataset::for_code("B25064_001E"), Dataset::Detailed);
    }

    #[test]
    fn explicit_dataset_wins() {
        let def = MetricDefinition {
            code: "DP04_0001E".to_string(),
            label: "Total housing units".to_string(),
            category: MetricCategory::Housing,
            source: MetricSource::Acs,
            core: true,
            dataset: Some(Dataset::Detailed),
        };
        assert_eq!(def.dataset(), Dataset::Detailed);
    }

    #[test]
    fn parses_selection_case_insensitively() {
        assert_eq!("core".parse::<MetricSelection>(), Ok(MetricSelection::Core));
        assert_eq!("ALL".parse::<MetricSelection>(), Ok(MetricSelection::All));
        assert!("some".parse::<MetricSelection>().is_err());
    }

    #[test]
    fn category_labels() {
        assert_eq!(
            MetricCategory::Housing.label(),
            "Housing & Residential Investment"
        );
        assert_eq!(
            MetricCategory::BusinessEmployment.label(),
            "Business & Employment"
        );
    }

    #[test]
    fn missing_category_falls_into_general_section() {
        let def: MetricDefinition = serde_json::from_str(
            r#"{"code":"B01003_001E","label":"Total population","source":"ACS"}"#,
        )
        .unwrap();
        assert_eq!(def.category, MetricCategory::General);
        assert_eq!(MetricCategory::all().last(), Some(&MetricCategory::General));
    }
}
