#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics data sources and the batched fetcher.
//!
//! Every provider implements the [`DataSource`] trait and returns one
//! [`FlatRecord`] per ZIP code and period. The ACS provider sits on top of
//! [`batch::fetch_batched`], which splits long code lists into
//! upstream-sized chunks, issues them one after another through a
//! [`batch::ChunkTransport`] and merges the two-row tables it gets back.
//!
//! The core is stateless: nothing is cached or shared between fetches
//! except the read-only metric catalog.

pub mod acs;
pub mod batch;
pub mod business;
pub mod census;
pub mod config;
pub mod fixture;
pub mod gateway;
pub mod period;
pub mod progress;
pub mod table;

use async_trait::async_trait;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::{FlatRecord, MetricSource, Period};

pub use period::PeriodFetcher;

/// Errors that can occur while fetching statistics.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (connect, timeout, body read). The request URL
    /// is stripped, since it may carry the API key.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The upstream or the gateway answered with a non-success status.
    #[error("Census API returned {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The response body did not have the expected table shape.
    #[error("Malformed response: {message}")]
    Malformed {
        /// Description of what was wrong.
        message: String,
    },

    /// A source could not be configured (bad base URL, client build).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// A provider of metric values for a ZIP code and period.
///
/// Implementations must treat codes they cannot find as absent rather than
/// as errors, and must not expose partial records: either every request
/// behind a fetch succeeds, or the fetch fails.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Unique identifier for this source (e.g. `"acs"`).
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// The catalog source whose codes this provider serves.
    fn kind(&self) -> MetricSource;

    /// Retrieves values for `codes`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if any underlying request fails.
    async fn fetch(
        &self,
        zip: &ZipCode,
        period: Period,
        codes: &[String],
    ) -> Result<FlatRecord, SourceError>;
}
