//! The single outbound call the gateway makes.

use async_trait::async_trait;
use reqwest::Url;

use crate::GatewayError;

/// What the gateway needs from an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Body text.
    pub body: String,
}

impl UpstreamResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns `true` if the body was declared as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Performs the upstream GET.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches `url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] if no response was received.
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, GatewayError>;
}

/// [`Upstream`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, GatewayError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await?;
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
