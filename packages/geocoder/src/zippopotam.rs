//! Zippopotam ZIP code lookup client.
//!
//! `GET {base}/{zip}` answers with the places sharing that ZIP code. The
//! first place is used. An unknown ZIP code answers 404.
//!
//! See <https://www.zippopotam.us/>

use async_trait::async_trait;
use census_explorer_geography_models::{ZipCode, ZipLocation};

use crate::{GeocodeError, LocationLookup};

/// Default base URL, overridable with `ZIP_LOOKUP_BASE_URL`.
pub const DEFAULT_ZIP_LOOKUP_BASE_URL: &str = "https://api.zippopotam.us/us";

/// Lookup client for the Zippopotam API.
#[derive(Debug, Clone)]
pub struct ZippopotamLookup {
    client: reqwest::Client,
    base_url: String,
}

impl ZippopotamLookup {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a client for `ZIP_LOOKUP_BASE_URL`, or the public instance.
    #[must_use]
    pub fn from_env(client: reqwest::Client) -> Self {
        let base_url = std::env::var("ZIP_LOOKUP_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ZIP_LOOKUP_BASE_URL.to_string());
        Self::new(client, &base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LocationLookup for ZippopotamLookup {
    fn name(&self) -> &str {
        "zippopotam"
    }

    async fn locate(&self, zip: &ZipCode) -> Result<Option<ZipLocation>, GeocodeError> {
        let url = format!("{}/{zip}", self.base_url);
        log::debug!("Looking up {url}");

        let resp = self.client.get(&url).send().await?;
        match resp.status() {
            reqwest::StatusCode::NOT_FOUND => return Ok(None),
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(GeocodeError::RateLimited),
            status if !status.is_success() => {
                return Err(GeocodeError::Status {
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(zip, &body)
    }
}

/// Parses a Zippopotam response body.
fn parse_response(
    zip: &ZipCode,
    body: &serde_json::Value,
) -> Result<Option<ZipLocation>, GeocodeError> {
    let places = body["places"].as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Zippopotam response has no places array".to_string(),
    })?;

    let Some(first) = places.first() else {
        return Ok(None);
    };

    let coordinate = |field: &str| {
        first[field]
            .as_str()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .or_else(|| first[field].as_f64())
            .ok_or_else(|| GeocodeError::Parse {
                message: format!("Missing {field} in Zippopotam response"),
            })
    };

    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;

    Ok(Some(ZipLocation {
        zip: zip.clone(),
        latitude,
        longitude,
        place_name: first["place name"].as_str().unwrap_or_default().to_string(),
        state_abbr: first["state abbreviation"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zip() -> ZipCode {
        ZipCode::parse("10001").unwrap()
    }

    #[test]
    fn parses_zippopotam_result() {
        let body = serde_json::json!({
            "post code": "10001",
            "country": "United States",
            "country abbreviation": "US",
            "places": [{
                "place name": "New York City",
                "longitude": "-73.9967",
                "state": "New York",
                "state abbreviation": "NY",
                "latitude": "40.7484"
            }]
        });
        let location = parse_response(&zip(), &body).unwrap().unwrap();
        assert!((location.latitude - 40.7484).abs() < 1e-4);
        assert!((location.longitude - -73.9967).abs() < 1e-4);
        assert_eq!(location.place_name, "New York City");
        assert_eq!(location.state_abbr, "NY");
        assert_eq!(location.zip, zip());
    }

    #[test]
    fn parses_empty_places() {
        let body = serde_json::json!({ "places": [] });
        assert!(parse_response(&zip(), &body).unwrap().is_none());
    }

    #[test]
    fn rejects_missing_coordinates() {
        let body = serde_json::json!({ "places": [{ "place name": "Nowhere" }] });
        assert!(matches!(
            parse_response(&zip(), &body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_non_object_body() {
        assert!(parse_response(&zip(), &serde_json::json!([])).is_err());
    }

    #[test]
    fn trims_trailing_slash() {
        let lookup = ZippopotamLookup::new(reqwest::Client::new(), "http://localhost:9/us/");
        assert_eq!(lookup.base_url(), "http://localhost:9/us");
    }
}
