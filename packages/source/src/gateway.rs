//! Chunk transport talking to the proxy gateway.
//!
//! The gateway holds the credential and forwards each request to the
//! statistics API unchanged, so this transport never sees a key.

use async_trait::async_trait;

use crate::SourceError;
use crate::batch::{ChunkRequest, ChunkTransport};
use crate::census::read_json_body;

/// Path of the gateway endpoint below its base URL.
pub const GATEWAY_PATH: &str = "/api/census";

/// Chunk transport that calls `GET {base}/api/census`.
pub struct GatewayTransport {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayTransport {
    /// Creates a transport for the gateway at `base_url`
    /// (e.g. `"http://127.0.0.1:8080"`).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}{GATEWAY_PATH}", self.base_url)
    }
}

#[async_trait]
impl ChunkTransport for GatewayTransport {
    async fn fetch_chunk(
        &self,
        request: &ChunkRequest<'_>,
    ) -> Result<serde_json::Value, SourceError> {
        let vars = request.codes.join(",");
        let year = request.period.to_string();
        let endpoint = self.endpoint();
        log::debug!(
            "GET {endpoint} zip={} year={year} dataset={} ({} vars)",
            request.zip,
            request.dataset,
            request.codes.len()
        );

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("zip", request.zip.as_str()),
                ("year", year.as_str()),
                ("vars", vars.as_str()),
                ("dataset", request.dataset.as_ref()),
            ])
            .send()
            .await?;

        read_json_body(response).await
    }
}
