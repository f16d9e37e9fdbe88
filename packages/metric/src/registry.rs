//! Compile-time registry of metric definitions.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! A file holds one `[[metric]]` table per definition; files are
//! concatenated in the order listed here, which is also the table order.

use std::sync::LazyLock;

use census_explorer_metric_models::MetricDefinition;
use serde::Deserialize;

use crate::{CatalogError, MetricCatalog};

/// Number of registered metrics. Enforced by a test.
#[cfg(test)]
const EXPECTED_METRIC_COUNT: usize = 53;

/// Embedded TOML catalog files.
const CATALOG_TOMLS: &[(&str, &str)] = &[
    ("housing", include_str!("../catalog/housing.toml")),
    (
        "business_employment",
        include_str!("../catalog/business_employment.toml"),
    ),
];

#[derive(Deserialize)]
struct CatalogFile {
    metric: Vec<MetricDefinition>,
}

static DEFAULT_CATALOG: LazyLock<MetricCatalog> = LazyLock::new(|| {
    load_catalog().unwrap_or_else(|e| panic!("Embedded metric catalog is invalid: {e}"))
});

/// Parses and validates the embedded catalog files.
///
/// # Errors
///
/// Returns [`CatalogError`] if a file fails to parse or the combined
/// definitions are invalid.
pub fn load_catalog() -> Result<MetricCatalog, CatalogError> {
    let mut metrics = Vec::new();
    for (name, toml_str) in CATALOG_TOMLS {
        let file: CatalogFile =
            toml::de::from_str(toml_str).map_err(|source| CatalogError::Parse {
                name: (*name).to_string(),
                source,
            })?;
        log::debug!("Loaded {} metrics from catalog file '{name}'", file.metric.len());
        metrics.extend(file.metric);
    }
    MetricCatalog::new(metrics)
}

/// Returns the shared catalog built from the embedded files.
///
/// # Panics
///
/// Panics on first use if the embedded TOML is malformed. Since the files
/// are compile-time constants, this indicates a development error and is
/// caught by the tests below.
#[must_use]
pub fn default_catalog() -> &'static MetricCatalog {
    &DEFAULT_CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;
    use census_explorer_metric_models::{Dataset, MetricCategory, MetricSelection, MetricSource};

    #[test]
    fn loads_all_metrics() {
        let catalog = load_catalog().unwrap();
        assert_eq!(
            catalog.len(),
            EXPECTED_METRIC_COUNT,
            "Expected {EXPECTED_METRIC_COUNT} metrics, found {}. \
             Update EXPECTED_METRIC_COUNT after adding/removing metrics.",
            catalog.len()
        );
    }

    #[test]
    fn acs_codes_fit_in_one_request_per_dataset() {
        let catalog = default_catalog();
        let acs = catalog.codes_for_source(MetricSource::Acs, MetricSelection::All);
        assert_eq!(acs.len(), 50);
        let zbp = catalog.codes_for_source(MetricSource::Zbp, MetricSelection::All);
        assert_eq!(zbp, vec!["ZBP_ESTAB", "ZBP_EMP", "ZBP_PAYANN"]);
    }

    #[test]
    fn core_selection_is_the_reduced_set() {
        let catalog = default_catalog();
        let core_acs = catalog.codes_for_source(MetricSource::Acs, MetricSelection::Core);
        assert_eq!(core_acs.len(), 23);
        assert!(core_acs.iter().any(|c| c == "B25064_001E"));
        assert!(!core_acs.iter().any(|c| c == "DP04_0046E"));
    }

    #[test]
    fn housing_section_comes_first_with_25_rows() {
        let sections = default_catalog().sections();
        assert_eq!(sections[0].0, MetricCategory::Housing);
        assert_eq!(sections[0].1.len(), 25);
        assert_eq!(sections[1].1.len(), 28);
    }

    #[test]
    fn profile_codes_route_to_profile_dataset() {
        let catalog = default_catalog();
        assert_eq!(catalog.get("DP04_0089E").unwrap().dataset(), Dataset::Profile);
        assert_eq!(catalog.get("B25077_001E").unwrap().dataset(), Dataset::Detailed);
    }

    #[test]
    fn all_metrics_have_required_fields() {
        for metric in default_catalog().metrics() {
            assert!(!metric.code.is_empty(), "Metric has empty code");
            assert!(!metric.label.is_empty(), "Metric {} has empty label", metric.code);
        }
    }
}
