#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! ZIP code location lookup.
//!
//! Resolves a ZIP code to a point, a place name and a state abbreviation
//! for the dashboard map. The lookup only feeds the map: a failure never
//! blocks the statistics.
//!
//! Providers implement [`LocationLookup`]:
//!
//! 1. **Zippopotam** ([`zippopotam::ZippopotamLookup`]) - free, no API key.
//! 2. **Static** ([`StaticLookup`]) - in-memory table for tests and demos.

pub mod zippopotam;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use census_explorer_geography_models::{ZipCode, ZipLocation};
use thiserror::Error;

pub use zippopotam::ZippopotamLookup;

/// Errors from location lookups.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an unexpected status.
    #[error("Lookup service returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Resolves ZIP codes to map locations.
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Looks up `zip`. Returns `Ok(None)` when the provider does not know
    /// the ZIP code.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider cannot be reached or answers
    /// with something unexpected.
    async fn locate(&self, zip: &ZipCode) -> Result<Option<ZipLocation>, GeocodeError>;
}

/// Lookup backed by a fixed table.
#[derive(Debug, Default)]
pub struct StaticLookup {
    locations: BTreeMap<ZipCode, ZipLocation>,
    failing: bool,
    calls: AtomicUsize,
}

impl StaticLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `location` to the table.
    #[must_use]
    pub fn with_location(mut self, location: ZipLocation) -> Self {
        self.locations.insert(location.zip.clone(), location);
        self
    }

    /// Makes every lookup fail with a 503.
    #[must_use]
    pub const fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of lookups started so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationLookup for StaticLookup {
    fn name(&self) -> &str {
        "static"
    }

    async fn locate(&self, zip: &ZipCode) -> Result<Option<ZipLocation>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(GeocodeError::Status { status: 503 });
        }
        Ok(self.locations.get(zip).cloned())
    }
}
