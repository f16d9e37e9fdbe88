//! One dashboard load: validate, fetch, compare, build the view.

use std::sync::Arc;

use census_explorer_compare::compare_records;
use census_explorer_geocoder::LocationLookup;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric::MetricCatalog;
use census_explorer_metric_models::Period;
use census_explorer_source::{PeriodFetcher, SourceError};
use thiserror::Error;

use crate::notify::NotificationLevel;
use crate::view::{DashboardView, MapMarker, MapView};

pub const INVALID_ZIP_MESSAGE: &str = "Please enter a valid 5-digit ZIP code";
pub const INVALID_YEAR_MESSAGE: &str = "Please select a valid year";
pub const COMPARISON_FAILED_MESSAGE: &str = "Could not load comparison data";
pub const LOCATE_FAILED_MESSAGE: &str = "Could not locate ZIP code on map";
pub const LOADED_MESSAGE: &str = "Data loaded successfully";

/// Why a load produced no view.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input was rejected before any network call.
    #[error("{message}")]
    Validation {
        /// Message shown to the user.
        message: String,
    },

    /// The primary period could not be fetched. The location lookup ran
    /// alongside it, so its outcome is still reported.
    #[error("Error loading data: {source}")]
    PrimaryFetch {
        #[source]
        source: SourceError,
        /// Map focus if the ZIP code was located.
        map: Option<MapView>,
        /// Non-blocking problems detected before the failure.
        warnings: Vec<String>,
    },
}

impl LoadError {
    fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// The message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Messages to post: warnings found alongside the failure, then the
    /// failure itself.
    #[must_use]
    pub fn notifications(&self) -> Vec<(NotificationLevel, String)> {
        let warnings = match self {
            Self::Validation { .. } => &[][..],
            Self::PrimaryFetch { warnings, .. } => warnings.as_slice(),
        };
        warnings
            .iter()
            .map(|w| (NotificationLevel::Warning, w.clone()))
            .chain(std::iter::once((
                NotificationLevel::Danger,
                self.user_message(),
            )))
            .collect()
    }
}

/// What the data layer needs for a load.
#[derive(Clone)]
pub struct DashboardServices {
    pub fetcher: PeriodFetcher,
    pub lookup: Arc<dyn LocationLookup>,
}

impl DashboardServices {
    #[must_use]
    pub fn new(fetcher: PeriodFetcher, lookup: Arc<dyn LocationLookup>) -> Self {
        Self { fetcher, lookup }
    }

    #[must_use]
    pub fn catalog(&self) -> &MetricCatalog {
        self.fetcher.catalog()
    }
}

/// Raw form input: ZIP code text, primary year and optional comparison
/// year. An empty comparison year means "No comparison".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadRequest {
    pub zip: String,
    pub year: String,
    pub compare_year: Option<String>,
}

impl LoadRequest {
    #[must_use]
    pub fn new(zip: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            zip: zip.into(),
            year: year.into(),
            compare_year: None,
        }
    }

    #[must_use]
    pub fn with_comparison(mut self, year: impl Into<String>) -> Self {
        self.compare_year = Some(year.into());
        self
    }

    /// Validates the input without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Validation`] for a malformed ZIP code or year.
    pub fn validate(&self) -> Result<ValidLoad, LoadError> {
        let zip = ZipCode::parse(&self.zip).map_err(|_| LoadError::validation(INVALID_ZIP_MESSAGE))?;
        let primary =
            Period::parse(&self.year).map_err(|_| LoadError::validation(INVALID_YEAR_MESSAGE))?;
        let comparison = match self.compare_year.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(year) => {
                Some(Period::parse(year).map_err(|_| LoadError::validation(INVALID_YEAR_MESSAGE))?)
            }
        };
        Ok(ValidLoad {
            zip,
            primary,
            comparison,
        })
    }
}

/// A validated load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLoad {
    pub zip: ZipCode,
    pub primary: Period,
    pub comparison: Option<Period>,
}

/// A successful load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub view: DashboardView,
    /// Non-blocking problems, in the order they were detected.
    pub warnings: Vec<String>,
}

impl LoadReport {
    /// Messages to post: every warning, then the success message.
    #[must_use]
    pub fn notifications(&self) -> Vec<(NotificationLevel, String)> {
        self.warnings
            .iter()
            .map(|w| (NotificationLevel::Warning, w.clone()))
            .chain(std::iter::once((
                NotificationLevel::Success,
                LOADED_MESSAGE.to_string(),
            )))
            .collect()
    }
}

/// Validates `request` and runs it.
///
/// # Errors
///
/// Returns [`LoadError`] if validation or the primary fetch fails.
pub async fn run_load(
    services: &DashboardServices,
    request: &LoadRequest,
) -> Result<LoadReport, LoadError> {
    let load = request.validate()?;
    run_valid_load(services, &load).await
}

/// Runs a validated load. The location lookup, the primary fetch and the
/// comparison fetch run concurrently.
///
/// # Errors
///
/// Returns [`LoadError::PrimaryFetch`] if the primary period fails.
pub async fn run_valid_load(
    services: &DashboardServices,
    load: &ValidLoad,
) -> Result<LoadReport, LoadError> {
    let zip = &load.zip;
    log::info!(
        "Loading {zip} for {}{}",
        load.primary,
        load.comparison
            .map(|p| format!(" vs {p}"))
            .unwrap_or_default()
    );

    let (location, primary, comparison) = tokio::join!(
        services.lookup.locate(zip),
        services.fetcher.fetch(zip, load.primary),
        async {
            match load.comparison {
                Some(period) => Some(services.fetcher.fetch(zip, period).await),
                None => None,
            }
        }
    );

    let mut warnings = Vec::new();

    let location = match location {
        Ok(Some(location)) => Some(location),
        Ok(None) => {
            log::warn!("{} does not know {zip}", services.lookup.name());
            warnings.push(LOCATE_FAILED_MESSAGE.to_string());
            None
        }
        Err(e) => {
            log::warn!("Location lookup for {zip} failed: {e}");
            warnings.push(LOCATE_FAILED_MESSAGE.to_string());
            None
        }
    };

    let primary = match primary {
        Ok(record) => record,
        Err(e) => {
            log::error!("Primary fetch for {zip} ({}) failed: {e}", load.primary);
            return Err(LoadError::PrimaryFetch {
                source: e,
                map: location
                    .as_ref()
                    .map(|l| MapView::focused(MapMarker::new(l))),
                warnings,
            });
        }
    };

    let comparison = match comparison {
        Some(Ok(record)) => Some(record),
        Some(Err(e)) => {
            log::warn!("Comparison fetch for {zip} failed: {e}");
            warnings.push(COMPARISON_FAILED_MESSAGE.to_string());
            None
        }
        None => None,
    };

    let results = compare_records(services.catalog(), &primary, comparison.as_ref());
    let view = DashboardView::build(
        zip.clone(),
        load.primary,
        load.comparison,
        comparison.is_some(),
        &results,
        location.as_ref(),
    );

    Ok(LoadReport { view, warnings })
}
