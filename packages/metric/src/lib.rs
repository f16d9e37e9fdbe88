#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static metric catalog.
//!
//! Maps each metric code to its label, category and upstream source. The
//! catalog is built once from TOML files embedded at compile time (see
//! [`registry`]) and never mutated afterwards, so a single instance can be
//! shared by reference across concurrent fetches.

pub mod registry;

use std::collections::BTreeMap;

use census_explorer_metric_models::{
    FlatRecord, MetricCategory, MetricDefinition, MetricSelection, MetricSource,
};

pub use registry::{default_catalog, load_catalog};

/// Errors raised while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An embedded TOML file failed to parse.
    #[error("Failed to parse catalog file '{name}': {source}")]
    Parse {
        /// Name of the embedded file.
        name: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Two definitions share a code.
    #[error("Duplicate metric code: {code}")]
    DuplicateCode {
        /// The repeated code.
        code: String,
    },

    /// A definition has an empty code or label.
    #[error("Metric definition #{index} is missing a code or label")]
    Incomplete {
        /// Position of the definition in catalog order.
        index: usize,
    },
}

/// Immutable, ordered set of metric definitions.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    metrics: Vec<MetricDefinition>,
    index: BTreeMap<String, usize>,
}

impl MetricCatalog {
    /// Builds a catalog, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if a code repeats or a definition has an
    /// empty code or label.
    pub fn new(metrics: Vec<MetricDefinition>) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();
        for (i, metric) in metrics.iter().enumerate() {
            if metric.code.trim().is_empty() || metric.label.trim().is_empty() {
                return Err(CatalogError::Incomplete { index: i });
            }
            if index.insert(metric.code.clone(), i).is_some() {
                return Err(CatalogError::DuplicateCode {
                    code: metric.code.clone(),
                });
            }
        }
        Ok(Self { metrics, index })
    }

    /// All definitions in catalog order.
    #[must_use]
    pub fn metrics(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns `true` if the catalog has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Looks up a definition by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&MetricDefinition> {
        self.index.get(code).map(|&i| &self.metrics[i])
    }

    /// Looks up a label by code.
    #[must_use]
    pub fn label(&self, code: &str) -> Option<&str> {
        self.get(code).map(|m| m.label.as_str())
    }

    /// Every code, in catalog order.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.code.as_str()).collect()
    }

    /// Definitions included by `selection`, in catalog order.
    pub fn selected(
        &self,
        selection: MetricSelection,
    ) -> impl Iterator<Item = &MetricDefinition> + '_ {
        self.metrics
            .iter()
            .filter(move |m| m.is_selected(selection))
    }

    /// Codes served by `source` and included by `selection`, in catalog
    /// order. This is the list handed to that source's fetcher.
    #[must_use]
    pub fn codes_for_source(&self, source: MetricSource, selection: MetricSelection) -> Vec<String> {
        self.selected(selection)
            .filter(|m| m.source == source)
            .map(|m| m.code.clone())
            .collect()
    }

    /// Definitions in `category`, in catalog order.
    pub fn by_category(
        &self,
        category: MetricCategory,
    ) -> impl Iterator<Item = &MetricDefinition> + '_ {
        self.metrics.iter().filter(move |m| m.category == category)
    }

    /// Table sections: each category (in display order) with its
    /// definitions. Categories without definitions are skipped.
    #[must_use]
    pub fn sections(&self) -> Vec<(MetricCategory, Vec<&MetricDefinition>)> {
        MetricCategory::all()
            .iter()
            .map(|&category| (category, self.by_category(category).collect::<Vec<_>>()))
            .filter(|(_, metrics)| !metrics.is_empty())
            .collect()
    }

    /// Codes present in `record` that the catalog does not know. These are
    /// ignored by presentation; the list is only useful for diagnostics.
    #[must_use]
    pub fn unknown_codes<'a>(&self, record: &'a FlatRecord) -> Vec<&'a str> {
        record
            .codes()
            .filter(|code| !self.index.contains_key(*code))
            .collect()
    }
}
