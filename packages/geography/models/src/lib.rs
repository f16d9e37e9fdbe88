#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! ZIP code geography identifier and location types.
//!
//! The dashboard queries one ZIP Code Tabulation Area at a time. A
//! [`ZipCode`] can only be constructed from exactly five ASCII digits, so
//! every downstream consumer (fetchers, the gateway, the geocoder) can
//! interpolate it into URLs without further checks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Number of digits in a US ZIP code.
pub const ZIP_CODE_LEN: usize = 5;

/// A validated 5-digit US ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    /// Parses a ZIP code, trimming surrounding whitespace first.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidZipCodeError`] unless the trimmed input is exactly
    /// five ASCII digits.
    pub fn parse(input: &str) -> Result<Self, InvalidZipCodeError> {
        let trimmed = input.trim();
        if is_zip_code(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidZipCodeError {
                input: input.to_string(),
            })
        }
    }

    /// Returns the five digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `s` is exactly five ASCII digits.
#[must_use]
pub fn is_zip_code(s: &str) -> bool {
    s.len() == ZIP_CODE_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZipCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ZipCode {
    type Err = InvalidZipCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ZipCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a string is not a valid 5-digit ZIP code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidZipCodeError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for InvalidZipCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ZIP code {:?}: expected 5 digits", self.input)
    }
}

impl std::error::Error for InvalidZipCodeError {}

/// Where a ZIP code is on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipLocation {
    /// The ZIP code that was looked up.
    pub zip: ZipCode,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Place name (e.g. "New York City").
    pub place_name: String,
    /// Two-letter state abbreviation.
    pub state_abbr: String,
}
