#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the census explorer server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the catalog and dashboard types to allow independent evolution of
//! the API contract.

use census_explorer_dashboard::{DashboardView, Notification};
use census_explorer_metric_models::{MetricCategory, MetricDefinition, MetricSource, Period};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body used by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Query parameters for the dashboard endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// 5-digit ZIP code.
    pub zip: Option<String>,
    /// Primary period. Defaults to the latest period.
    pub year: Option<String>,
    /// Optional comparison period. Empty means no comparison.
    pub compare_year: Option<String>,
}

/// A catalog metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetric {
    pub code: String,
    pub label: String,
    pub source: MetricSource,
    /// Whether the metric is in the reduced, more reliable subset.
    pub core: bool,
}

impl From<&MetricDefinition> for ApiMetric {
    fn from(def: &MetricDefinition) -> Self {
        Self {
            code: def.code.clone(),
            label: def.label.clone(),
            source: def.source,
            core: def.core,
        }
    }
}

/// One table section of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetricSection {
    pub category: MetricCategory,
    /// Section heading.
    pub title: String,
    pub metrics: Vec<ApiMetric>,
}

/// A selectable period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPeriod {
    pub year: u16,
    /// Picker label, e.g. `2023 (2019-2023)`.
    pub label: String,
}

impl From<Period> for ApiPeriod {
    fn from(period: Period) -> Self {
        Self {
            year: period.year(),
            label: period.label(),
        }
    }
}

/// Period picker contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPeriods {
    /// Primary period selected by default.
    pub default_year: u16,
    /// Newest first.
    pub periods: Vec<ApiPeriod>,
}

/// Dashboard endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDashboard {
    #[serde(flatten)]
    pub view: DashboardView,
    /// Warnings followed by the success message.
    pub notifications: Vec<Notification>,
}
