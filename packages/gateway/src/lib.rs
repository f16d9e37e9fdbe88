#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Credentialed pass-through to the Census statistics API.
//!
//! Callers send `zip`, `year` and `vars` (plus an optional `dataset`); the
//! gateway validates them, adds the server-held key and forwards the
//! upstream answer. The key never leaves the server: it is redacted from
//! logs and never echoed in responses.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | No key configured | 500 | `{ "error": ... }` |
//! | Missing or invalid parameter | 400 | `{ "error": ... }` |
//! | Upstream non-success | upstream status | `{ "error": <upstream text> }` |
//! | Upstream success | 200 | upstream JSON, unchanged |
//! | No upstream response | 502 | `{ "error": "Proxy error: ..." }` |

pub mod handler;
pub mod upstream;

use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::{Dataset, Period};
use census_explorer_source::batch::CHUNK_LIMIT;
use census_explorer_source::census::{DEFAULT_CENSUS_BASE_URL, acs_url, redact_key};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use handler::{GatewayState, configure};
pub use upstream::{ReqwestUpstream, Upstream, UpstreamResponse};

pub const MISSING_KEY_MESSAGE: &str = "Census API key not set in environment.";
pub const MISSING_PARAMS_MESSAGE: &str = "Missing required query parameters: zip, year, vars.";
pub const INVALID_ZIP_MESSAGE: &str = "ZIP code must be a 5-digit number.";
pub const TOO_MANY_VARS_MESSAGE: &str = "Too many variables requested. Limit is 50 per request.";

/// Errors that prevent the gateway from getting an upstream answer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The upstream could not be reached or its body could not be read.
    /// The request URL is stripped, since it carries the key.
    #[error("{0}")]
    Network(reqwest::Error),

    /// The upstream URL could not be built.
    #[error("{message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// The upstream declared JSON but sent something else.
    #[error("invalid JSON from upstream: {0}")]
    Body(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.without_url())
    }
}

/// Gateway settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Statistics API base URL (`CENSUS_API_BASE_URL`).
    pub base_url: String,
    /// Server-held credential (`CENSUS_API_KEY`).
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CENSUS_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let config = Self {
            base_url: var("CENSUS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CENSUS_BASE_URL.to_string()),
            api_key: var("CENSUS_API_KEY"),
        };
        if config.api_key.is_none() {
            log::warn!("CENSUS_API_KEY is not set; /api/census will answer 500");
        }
        config
    }
}

/// Raw gateway query parameters. Every field is optional so that missing
/// ones can be reported with the gateway's own message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusQueryParams {
    pub zip: Option<String>,
    pub year: Option<String>,
    /// Comma-separated metric codes.
    pub vars: Option<String>,
    /// `detailed` (default) or `profile`.
    pub dataset: Option<String>,
}

/// A request refused before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRejection {
    pub status: u16,
    pub message: String,
}

impl GatewayRejection {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }
}

/// A validated gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub zip: ZipCode,
    pub period: Period,
    pub dataset: Dataset,
    pub codes: Vec<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Checks `params` in the order the gateway reports problems: credential,
/// missing parameters, ZIP code, code count, year, dataset.
///
/// # Errors
///
/// Returns the [`GatewayRejection`] to send back.
pub fn validate(
    config: &GatewayConfig,
    params: &CensusQueryParams,
) -> Result<ValidRequest, GatewayRejection> {
    if config.api_key.is_none() {
        return Err(GatewayRejection {
            status: 500,
            message: MISSING_KEY_MESSAGE.to_string(),
        });
    }

    let (Some(zip), Some(year), Some(vars)) = (
        present(params.zip.as_ref()),
        present(params.year.as_ref()),
        present(params.vars.as_ref()),
    ) else {
        return Err(GatewayRejection::bad_request(MISSING_PARAMS_MESSAGE));
    };

    if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayRejection::bad_request(INVALID_ZIP_MESSAGE));
    }
    let zip = ZipCode::parse(zip).map_err(|_| GatewayRejection::bad_request(INVALID_ZIP_MESSAGE))?;

    let codes: Vec<String> = vars.split(',').map(|c| c.trim().to_string()).collect();
    if codes.len() > CHUNK_LIMIT {
        return Err(GatewayRejection::bad_request(TOO_MANY_VARS_MESSAGE));
    }
    if codes.iter().any(String::is_empty) {
        return Err(GatewayRejection::bad_request(
            "Variable list contains an empty entry.",
        ));
    }

    let period = Period::parse(year)
        .map_err(|_| GatewayRejection::bad_request("Year must be a 4-digit number."))?;

    let dataset = match present(params.dataset.as_ref()) {
        None => Dataset::Detailed,
        Some(raw) => raw.parse().map_err(|_| {
            GatewayRejection::bad_request(format!("Unknown dataset '{raw}'."))
        })?,
    };

    Ok(ValidRequest {
        zip,
        period,
        dataset,
        codes,
    })
}

/// The answer to send back.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl GatewayReply {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.into() }),
        }
    }
}

impl From<GatewayRejection> for GatewayReply {
    fn from(rejection: GatewayRejection) -> Self {
        Self::error(rejection.status, rejection.message)
    }
}

/// Validates `params`, calls the upstream and shapes its answer.
pub async fn forward(
    upstream: &dyn Upstream,
    config: &GatewayConfig,
    params: &CensusQueryParams,
) -> GatewayReply {
    let request = match validate(config, params) {
        Ok(request) => request,
        Err(rejection) => {
            log::debug!("Rejected gateway request: {}", rejection.message);
            return rejection.into();
        }
    };

    match call_upstream(upstream, config, &request).await {
        Ok(reply) => reply,
        Err(e) => {
            log::error!("Gateway upstream call failed: {e}");
            GatewayReply::error(502, format!("Proxy error: {e}"))
        }
    }
}

async fn call_upstream(
    upstream: &dyn Upstream,
    config: &GatewayConfig,
    request: &ValidRequest,
) -> Result<GatewayReply, GatewayError> {
    let url = acs_url(
        &config.base_url,
        request.period,
        request.dataset,
        &request.codes,
        &request.zip,
        config.api_key.as_deref(),
    )
    .map_err(|e| GatewayError::Config {
        message: e.to_string(),
    })?;

    log::info!(
        "Forwarding {} vars for {} ({}) to {}",
        request.codes.len(),
        request.zip,
        request.period,
        redact_key(url.as_str())
    );

    let response = upstream.get(&url).await?;

    if !response.is_success() {
        log::warn!(
            "Upstream answered {} for {} ({})",
            response.status,
            request.zip,
            request.period
        );
        return Ok(GatewayReply::error(response.status, response.body));
    }

    let body = if response.is_json() {
        serde_json::from_str(&response.body)?
    } else {
        serde_json::Value::String(response.body)
    };

    Ok(GatewayReply { status: 200, body })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::Url;
    use std::sync::Mutex;

    /// Upstream double that records requested URLs.
    pub struct FakeUpstream {
        response: Option<UpstreamResponse>,
        pub urls: Mutex<Vec<Url>>,
    }

    impl FakeUpstream {
        pub fn answering(status: u16, content_type: &str, body: &str) -> Self {
            Self {
                response: Some(UpstreamResponse {
                    status,
                    content_type: Some(content_type.to_string()),
                    body: body.to_string(),
                }),
                urls: Mutex::new(Vec::new()),
            }
        }

        pub fn unreachable() -> Self {
            Self {
                response: None,
                urls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn get(&self, url: &Url) -> Result<UpstreamResponse, GatewayError> {
            self.urls.lock().unwrap().push(url.clone());
            self.response.clone().ok_or_else(|| GatewayError::Config {
                message: "connection refused".to_string(),
            })
        }
    }

    pub fn config() -> GatewayConfig {
        GatewayConfig {
            base_url: "https://census.test/data".to_string(),
            api_key: Some("secret-key".to_string()),
        }
    }

    pub fn params(zip: &str, year: &str, vars: &str) -> CensusQueryParams {
        CensusQueryParams {
            zip: Some(zip.to_string()),
            year: Some(year.to_string()),
            vars: Some(vars.to_string()),
            dataset: None,
        }
    }

    pub const TABLE: &str =
        r#"[["B01003_001E","zip code tabulation area"],["21102","10001"]]"#;

    #[tokio::test]
    async fn missing_key_is_500() {
        let upstream = FakeUpstream::answering(200, "application/json", TABLE);
        let config = GatewayConfig {
            api_key: None,
            ..config()
        };
        let reply = forward(&upstream, &config, &params("10001", "2023", "B01003_001E")).await;
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["error"], MISSING_KEY_MESSAGE);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn missing_params_are_400() {
        let upstream = FakeUpstream::answering(200, "application/json", TABLE);
        for params in [
            CensusQueryParams::default(),
            CensusQueryParams {
                zip: Some("10001".to_string()),
                year: Some("2023".to_string()),
                ..CensusQueryParams::default()
            },
            params("10001", "", "B01003_001E"),
        ] {
            let reply = forward(&upstream, &config(), &params).await;
            assert_eq!(reply.status, 400);
            assert_eq!(reply.body["error"], MISSING_PARAMS_MESSAGE);
        }
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn bad_zip_is_400() {
        let upstream = FakeUpstream::answering(200, "application/json", TABLE);
        for zip in ["abcde", "1234", "123456", " 10001"] {
            let reply = forward(&upstream, &config(), &params(zip, "2023", "B01003_001E")).await;
            assert_eq!(reply.status, 400, "{zip}");
            assert_eq!(reply.body["error"], INVALID_ZIP_MESSAGE);
        }
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn too_many_vars_is_400() {
        let upstream = FakeUpstream::answering(200, "application/json", TABLE);
        let vars: Vec<String> = (0..51).map(|i| format!("B{i:05}_001E")).collect();
        let reply = forward(&upstream, &config(), &params("10001", "2023", &vars.join(","))).await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["error"], TOO_MANY_VARS_MESSAGE);

        let reply = forward(
            &upstream,
            &config(),
            &params("10001", "2023", &vars[..50].join(",")),
        )
        .await;
        assert_eq!(reply.status, 200);
    }

    #[tokio::test]
    async fn bad_year_and_dataset_are_400() {
        let upstream = FakeUpstream::answering(200, "application/json", TABLE);
        let reply = forward(&upstream, &config(), &params("10001", "20x3", "B01003_001E")).await;
        assert_eq!(reply.status, 400);

        let mut p = params("10001", "2023", "B01003_001E");
        p.dataset = Some("../../secret".to_string());
        let reply = forward(&upstream, &config(), &p).await;
        assert_eq!(reply.status, 400);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn forwards_json_unchanged_with_key() {
        let upstream = FakeUpstream::answering(200, "application/json;charset=utf-8", TABLE);
        let reply = forward(&upstream, &config(), &params("10001", "2022", "B01003_001E")).await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, serde_json::from_str::<serde_json::Value>(TABLE).unwrap());

        let urls = upstream.urls.lock().unwrap();
        let url = &urls[0];
        assert_eq!(url.path(), "/data/2022/acs/acs5");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("key".to_string(), "secret-key".to_string())));
        assert!(query.contains(&("get".to_string(), "B01003_001E".to_string())));
        assert!(query.contains(&(
            "for".to_string(),
            "zip code tabulation area:10001".to_string()
        )));
    }

    #[tokio::test]
    async fn profile_dataset_changes_path() {
        let upstream = FakeUpstream::answering(200, "application/json", TABLE);
        let mut p = params("10001", "2023", "DP04_0001E");
        p.dataset = Some("profile".to_string());
        let reply = forward(&upstream, &config(), &p).await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            upstream.urls.lock().unwrap()[0].path(),
            "/data/2023/acs/acs5/profile"
        );
    }

    #[tokio::test]
    async fn non_json_success_becomes_string() {
        let upstream = FakeUpstream::answering(200, "text/plain", "hello");
        let reply = forward(&upstream, &config(), &params("10001", "2023", "B01003_001E")).await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, serde_json::Value::String("hello".to_string()));
    }

    #[tokio::test]
    async fn upstream_failure_keeps_status() {
        let upstream = FakeUpstream::answering(404, "text/html", "error: unknown variable 'X'");
        let reply = forward(&upstream, &config(), &params("10001", "2023", "X")).await;
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body["error"], "error: unknown variable 'X'");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502_without_key() {
        let upstream = FakeUpstream::unreachable();
        let reply = forward(&upstream, &config(), &params("10001", "2023", "B01003_001E")).await;
        assert_eq!(reply.status, 502);
        let message = reply.body["error"].as_str().unwrap();
        assert!(message.starts_with("Proxy error: "));
        assert!(!message.contains("secret-key"));
    }

    #[tokio::test]
    async fn refused_connection_does_not_leak_key() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();
        let upstream = ReqwestUpstream::new(client);
        let config = GatewayConfig {
            base_url: "http://127.0.0.1:1/data".to_string(),
            ..config()
        };

        let reply = forward(&upstream, &config, &params("10001", "2023", "B01003_001E")).await;

        assert_eq!(reply.status, 502);
        let body = reply.body.to_string();
        assert!(body.contains("Proxy error: "));
        assert!(!body.contains("secret-key"), "{body}");
        assert!(!body.contains("127.0.0.1:1"), "{body}");
    }

    #[tokio::test]
    async fn invalid_json_success_is_502() {
        let upstream = FakeUpstream::answering(200, "application/json", "not json");
        let reply = forward(&upstream, &config(), &params("10001", "2023", "B01003_001E")).await;
        assert_eq!(reply.status, 502);
    }
}
