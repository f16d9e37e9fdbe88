#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Period-over-period comparison of flat records.
//!
//! The comparator is a pure function of its inputs: a primary
//! [`FlatRecord`], an optional comparison record and the metric catalog.
//! Every presentation adapter consumes the same [`ComparisonResult`] list.

pub mod format;

use census_explorer_metric::MetricCatalog;
use census_explorer_metric_models::{FlatRecord, MetricCategory, MetricDefinition, RawValue};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use format::{NO_DATA, format_number, format_percent, format_raw, round_tenths};

/// Direction of change from the comparison period to the primary period.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
    Neutral,
    /// One of the two values is not numeric.
    Unavailable,
}

impl Direction {
    /// Direction of `delta`.
    #[must_use]
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Increase
        } else if delta < 0.0 {
            Self::Decrease
        } else {
            Self::Neutral
        }
    }
}

/// Outcome of comparing one metric across two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Comparison {
    /// No comparison value: the period was not requested, its fetch failed,
    /// or it did not return this metric.
    NoComparison,
    /// A comparison value exists but one side is not numeric. Only the
    /// formatted comparison value is shown. `direction` is always
    /// [`Direction::Unavailable`].
    Informational {
        #[serde(rename = "compareDisplay")]
        compare_display: String,
        direction: Direction,
    },
    /// Both sides are numeric.
    Numeric {
        #[serde(rename = "compareValue")]
        compare_value: f64,
        #[serde(rename = "compareDisplay")]
        compare_display: String,
        delta: f64,
        /// Percent change rounded to one decimal. `None` when the
        /// comparison value is zero.
        #[serde(rename = "percentChange")]
        percent_change: Option<f64>,
        direction: Direction,
    },
}

impl Comparison {
    /// Returns the change direction, or `None` when there is nothing to
    /// compare against.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        match self {
            Self::NoComparison => None,
            Self::Informational { direction, .. } | Self::Numeric { direction, .. } => {
                Some(*direction)
            }
        }
    }

    #[must_use]
    pub const fn delta(&self) -> Option<f64> {
        match self {
            Self::Numeric { delta, .. } => Some(*delta),
            _ => None,
        }
    }

    #[must_use]
    pub const fn percent_change(&self) -> Option<f64> {
        match self {
            Self::Numeric { percent_change, .. } => *percent_change,
            _ => None,
        }
    }

    /// Formatted comparison value, if any.
    #[must_use]
    pub fn compare_display(&self) -> Option<&str> {
        match self {
            Self::NoComparison => None,
            Self::Informational { compare_display, .. } | Self::Numeric { compare_display, .. } => {
                Some(compare_display.as_str())
            }
        }
    }

    /// The delta line shown under the comparison value, e.g.
    /// `+1.5K (12.5%)`.
    #[must_use]
    pub fn delta_display(&self) -> Option<String> {
        match self {
            Self::Numeric {
                delta,
                percent_change,
                ..
            } => Some(format_delta(*delta, *percent_change)),
            _ => None,
        }
    }
}

/// Formats a delta with its sign and percent change.
#[must_use]
pub fn format_delta(delta: f64, percent_change: Option<f64>) -> String {
    let sign = if delta > 0.0 { "+" } else { "" };
    format!(
        "{sign}{} ({})",
        format_number(delta),
        format_percent(percent_change)
    )
}

/// Compares a primary value with an optional comparison value.
///
/// A null comparison value counts as absent.
#[must_use]
pub fn compare_values(primary: Option<&RawValue>, comparison: Option<&RawValue>) -> Comparison {
    let Some(comparison) = comparison.filter(|v| !matches!(v, RawValue::Null)) else {
        return Comparison::NoComparison;
    };
    let compare_display = format_raw(Some(comparison));

    match (primary.and_then(RawValue::as_number), comparison.as_number()) {
        (Some(primary), Some(compare_value)) => {
            let delta = primary - compare_value;
            let percent_change = (compare_value != 0.0)
                .then(|| round_tenths(delta / compare_value * 100.0))
                .filter(|p| p.is_finite());
            Comparison::Numeric {
                compare_value,
                compare_display,
                delta,
                percent_change,
                direction: Direction::of(delta),
            }
        }
        _ => Comparison::Informational {
            compare_display,
            direction: Direction::Unavailable,
        },
    }
}

/// One table row: a catalog metric with its primary value and comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub code: String,
    pub label: String,
    pub category: MetricCategory,
    pub primary_value: Option<RawValue>,
    pub primary_display: String,
    pub comparison: Comparison,
}

impl ComparisonResult {
    /// Compares one metric of `primary` against `comparison`.
    #[must_use]
    pub fn for_metric(
        metric: &MetricDefinition,
        primary: &FlatRecord,
        comparison: Option<&FlatRecord>,
    ) -> Self {
        let primary_value = primary.get(&metric.code);
        let compare_value = comparison.and_then(|record| record.get(&metric.code));
        Self {
            code: metric.code.clone(),
            label: metric.label.clone(),
            category: metric.category,
            primary_value: primary_value.cloned(),
            primary_display: format_raw(primary_value),
            comparison: compare_values(primary_value, compare_value),
        }
    }

    /// Numeric primary value, if any.
    #[must_use]
    pub fn primary_number(&self) -> Option<f64> {
        self.primary_value.as_ref().and_then(RawValue::as_number)
    }
}

/// Compares every catalog metric, in catalog order. Codes in the records
/// that the catalog does not know are ignored.
#[must_use]
pub fn compare_records(
    catalog: &MetricCatalog,
    primary: &FlatRecord,
    comparison: Option<&FlatRecord>,
) -> Vec<ComparisonResult> {
    catalog
        .metrics()
        .iter()
        .map(|metric| ComparisonResult::for_metric(metric, primary, comparison))
        .collect()
}
