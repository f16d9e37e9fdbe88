//! One-period fetch across every configured source.

use std::sync::Arc;

use census_explorer_geography_models::ZipCode;
use census_explorer_metric::MetricCatalog;
use census_explorer_metric_models::{FlatRecord, MetricSelection, Period};
use futures::future::try_join_all;

use crate::{DataSource, SourceError};

/// Fetches the selected catalog metrics for one ZIP code and period.
///
/// Each source receives only the codes whose catalog source matches its
/// [`DataSource::kind`]. Sources run concurrently and the fetch fails as a
/// whole if any of them fails.
#[derive(Clone)]
pub struct PeriodFetcher {
    catalog: Arc<MetricCatalog>,
    sources: Vec<Arc<dyn DataSource>>,
    selection: MetricSelection,
}

impl PeriodFetcher {
    #[must_use]
    pub fn new(catalog: Arc<MetricCatalog>, sources: Vec<Arc<dyn DataSource>>) -> Self {
        Self {
            catalog,
            sources,
            selection: MetricSelection::All,
        }
    }

    /// Restricts fetches to `selection`.
    #[must_use]
    pub const fn with_selection(mut self, selection: MetricSelection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub const fn catalog(&self) -> &Arc<MetricCatalog> {
        &self.catalog
    }

    #[must_use]
    pub const fn selection(&self) -> MetricSelection {
        self.selection
    }

    /// Returns one record holding every value the sources produced.
    ///
    /// # Errors
    ///
    /// Returns the first [`SourceError`] raised by any source.
    pub async fn fetch(&self, zip: &ZipCode, period: Period) -> Result<FlatRecord, SourceError> {
        let fetches = self.sources.iter().filter_map(|source| {
            let codes = self
                .catalog
                .codes_for_source(source.kind(), self.selection);
            if codes.is_empty() {
                return None;
            }
            Some(async move {
                log::debug!(
                    "Fetching {} codes from {} for {zip} ({period})",
                    codes.len(),
                    source.id()
                );
                source
                    .fetch(zip, period, &codes)
                    .await
                    .inspect_err(|e| log::warn!("{} fetch failed for {zip}: {e}", source.id()))
            })
        });

        let mut record = FlatRecord::new();
        for partial in try_join_all(fetches).await? {
            record.merge(partial);
        }

        log::info!("Fetched {} values for {zip} ({period})", record.len());
        Ok(record)
    }
}
