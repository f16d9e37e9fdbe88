//! Environment-driven source configuration.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `CENSUS_GATEWAY_URL` | Fetch through the proxy gateway at this base URL | unset |
//! | `CENSUS_API_BASE_URL` | Statistics API base for direct fetches | [`DEFAULT_CENSUS_BASE_URL`] |
//! | `CENSUS_API_KEY` | Credential for direct fetches | unset |
//! | `CENSUS_HTTP_TIMEOUT_SECS` | Per-request timeout | 30 |
//! | `CENSUS_METRICS` | `all` or `core` | `all` |

use std::sync::Arc;
use std::time::Duration;

use census_explorer_metric::MetricCatalog;
use census_explorer_metric_models::MetricSelection;

use crate::acs::AcsSource;
use crate::business::BusinessPatternSource;
use crate::census::{CensusTransport, DEFAULT_CENSUS_BASE_URL};
use crate::gateway::GatewayTransport;
use crate::progress::{ProgressCallback, null_progress};
use crate::{DataSource, SourceError};

/// Default per-request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// How ACS chunks reach the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Through the proxy gateway, which holds the credential.
    Gateway {
        /// Gateway base URL.
        base_url: String,
    },
    /// Straight to the statistics API.
    Direct {
        /// Statistics API base URL.
        base_url: String,
        /// Optional credential.
        api_key: Option<String>,
    },
}

/// Everything needed to build the data sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// ACS transport.
    pub transport: TransportConfig,
    /// Which catalog subset to fetch.
    pub selection: MetricSelection,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::Direct {
                base_url: DEFAULT_CENSUS_BASE_URL.to_string(),
                api_key: None,
            },
            selection: MetricSelection::All,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl SourceConfig {
    /// Reads the configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if set.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let transport = non_empty("CENSUS_GATEWAY_URL").map_or_else(
            || TransportConfig::Direct {
                base_url: non_empty("CENSUS_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CENSUS_BASE_URL.to_string()),
                api_key: non_empty("CENSUS_API_KEY"),
            },
            |base_url| TransportConfig::Gateway { base_url },
        );

        let selection = non_empty("CENSUS_METRICS")
            .and_then(|v| {
                v.parse()
                    .inspect_err(|_| log::warn!("Ignoring unknown CENSUS_METRICS value '{v}'"))
                    .ok()
            })
            .unwrap_or_default();

        Self {
            transport,
            selection,
            timeout: http_timeout(&lookup),
        }
    }
}

/// Reads `CENSUS_HTTP_TIMEOUT_SECS` through `lookup`.
fn http_timeout(lookup: &impl Fn(&str) -> Option<String>) -> Duration {
    lookup("CENSUS_HTTP_TIMEOUT_SECS")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs)
}

/// Per-request timeout from the environment.
#[must_use]
pub fn http_timeout_from_env() -> Duration {
    http_timeout(&|name: &str| std::env::var(name).ok())
}

/// Builds an HTTP client with the given per-request timeout.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("census-explorer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Into::into)
}

/// Builds the ACS and business-pattern sources described by `config`.
///
/// # Errors
///
/// Returns [`SourceError`] if the HTTP client cannot be built.
pub fn build_sources(
    config: &SourceConfig,
    catalog: &Arc<MetricCatalog>,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<Vec<Arc<dyn DataSource>>, SourceError> {
    let client = build_client(config.timeout)?;
    let progress = progress.unwrap_or_else(null_progress);

    let acs: Arc<dyn DataSource> = match &config.transport {
        TransportConfig::Gateway { base_url } => {
            log::info!("Fetching ACS data through gateway at {base_url}");
            Arc::new(
                AcsSource::new(GatewayTransport::new(client, base_url), Arc::clone(catalog))
                    .with_progress(progress),
            )
        }
        TransportConfig::Direct { base_url, api_key } => {
            if api_key.is_none() {
                log::warn!("CENSUS_API_KEY not set; direct requests are rate limited upstream");
            }
            log::info!("Fetching ACS data directly from {base_url}");
            Arc::new(
                AcsSource::new(
                    CensusTransport::new(client, base_url, api_key.clone()),
                    Arc::clone(catalog),
                )
                .with_progress(progress),
            )
        }
    };

    Ok(vec![acs, Arc::new(BusinessPatternSource::new())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_to_direct_all_metrics() {
        assert_eq!(SourceConfig::from_lookup(lookup(&[])), SourceConfig::default());
    }

    #[test]
    fn gateway_url_selects_gateway_transport() {
        let config = SourceConfig::from_lookup(lookup(&[
            ("CENSUS_GATEWAY_URL", "http://localhost:8080"),
            ("CENSUS_API_KEY", "ignored"),
        ]));
        assert_eq!(
            config.transport,
            TransportConfig::Gateway {
                base_url: "http://localhost:8080".to_string()
            }
        );
    }

    #[test]
    fn reads_key_selection_and_timeout() {
        let config = SourceConfig::from_lookup(lookup(&[
            ("CENSUS_API_KEY", "abc"),
            ("CENSUS_METRICS", "core"),
            ("CENSUS_HTTP_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(
            config.transport,
            TransportConfig::Direct {
                base_url: DEFAULT_CENSUS_BASE_URL.to_string(),
                api_key: Some("abc".to_string()),
            }
        );
        assert_eq!(config.selection, MetricSelection::Core);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn ignores_invalid_values() {
        let config = SourceConfig::from_lookup(lookup(&[
            ("CENSUS_METRICS", "everything"),
            ("CENSUS_HTTP_TIMEOUT_SECS", "0"),
            ("CENSUS_API_KEY", "  "),
        ]));
        assert_eq!(config, SourceConfig::default());
    }
}
