//! Direct client for the Census Bureau statistics API.
//!
//! Requests look like:
//!
//! ```text
//! GET {base}/{year}/acs/acs5?get=B25064_001E,B25077_001E
//!     &for=zip code tabulation area:10001&key=...
//! ```
//!
//! See <https://www.census.gov/data/developers/guidance/api-user-guide.html>

use async_trait::async_trait;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::{Dataset, Period};
use reqwest::Url;

use crate::SourceError;
use crate::batch::{ChunkRequest, ChunkTransport};
use crate::table::GEOGRAPHY_FIELD;

/// Default statistics API base URL.
pub const DEFAULT_CENSUS_BASE_URL: &str = "https://api.census.gov/data";

/// Builds the upstream URL for one chunk.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if `base_url` is not a valid URL.
pub fn acs_url(
    base_url: &str,
    period: Period,
    dataset: Dataset,
    codes: &[String],
    zip: &ZipCode,
    api_key: Option<&str>,
) -> Result<Url, SourceError> {
    let base = base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/{}/{}", period.year(), dataset.path())).map_err(
        |e| SourceError::Config {
            message: format!("Invalid Census base URL '{base_url}': {e}"),
        },
    )?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("get", &codes.join(","));
        query.append_pair("for", &format!("{GEOGRAPHY_FIELD}:{zip}"));
        if let Some(key) = api_key {
            query.append_pair("key", key);
        }
    }

    Ok(url)
}

/// Replaces the value of any `key` query parameter so URLs can be logged.
#[must_use]
pub fn redact_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("key=") {
                "key=REDACTED".to_string()
            } else {
                pair.to_string()
            }
        })
        .collect();
    format!("{base}?{}", redacted.join("&"))
}

/// Reads a response body as JSON, turning non-success statuses into
/// [`SourceError::Upstream`].
///
/// Error bodies shaped like `{ "error": "..." }` contribute their message;
/// anything else contributes its trimmed text.
pub(crate) async fn read_json_body(
    response: reqwest::Response,
) -> Result<serde_json::Value, SourceError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(SourceError::Upstream {
            status: status.as_u16(),
            message: error_message(&text, status),
        });
    }

    serde_json::from_str(&text).map_err(|e| SourceError::Malformed {
        message: format!("response is not JSON ({e}), received {} bytes", text.len()),
    })
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from));
    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        }
    })
}

/// Chunk transport talking to the statistics API directly.
///
/// Only suitable where the credential may be held locally (the server and
/// the CLI); browsers go through the gateway.
pub struct CensusTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CensusTransport {
    /// Creates a transport. `api_key` is optional; the upstream serves a
    /// limited number of keyless requests per day.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ChunkTransport for CensusTransport {
    async fn fetch_chunk(
        &self,
        request: &ChunkRequest<'_>,
    ) -> Result<serde_json::Value, SourceError> {
        let url = acs_url(
            &self.base_url,
            request.period,
            request.dataset,
            request.codes,
            request.zip,
            self.api_key.as_deref(),
        )?;
        log::debug!("GET {}", redact_key(url.as_str()));

        let response = self.client.get(url).send().await?;
        read_json_body(response).await
    }
}
