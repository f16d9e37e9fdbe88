//! Dataset vintage (year) selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Years offered by the period pickers, newest first.
pub const AVAILABLE_YEARS: &[u16] = &[2023, 2022, 2021, 2020, 2019, 2018, 2017];

/// Span of an ACS 5-year estimate, inclusive of the vintage year.
const ESTIMATE_SPAN_YEARS: u16 = 5;

/// A dataset vintage, identified by its end year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Period(u16);

impl Period {
    /// The period selected when nothing else is chosen.
    pub const LATEST: Self = Self(2023);

    /// Parses a period from exactly four ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPeriodError`] for anything else.
    pub fn parse(input: &str) -> Result<Self, InvalidPeriodError> {
        let trimmed = input.trim();
        if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            trimmed
                .parse::<u16>()
                .map(Self)
                .map_err(|_| InvalidPeriodError {
                    input: input.to_string(),
                })
        } else {
            Err(InvalidPeriodError {
                input: input.to_string(),
            })
        }
    }

    /// Creates a period from a year without range checks.
    #[must_use]
    pub const fn from_year(year: u16) -> Self {
        Self(year)
    }

    /// Returns the vintage year.
    #[must_use]
    pub const fn year(self) -> u16 {
        self.0
    }

    /// First year covered by the 5-year estimate.
    #[must_use]
    pub const fn window_start(self) -> u16 {
        self.0.saturating_sub(ESTIMATE_SPAN_YEARS - 1)
    }

    /// Picker label, e.g. `"2023 (2019-2023)"`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{} ({}-{})", self.0, self.window_start(), self.0)
    }

    /// All periods offered by the pickers, newest first.
    #[must_use]
    pub fn available() -> Vec<Self> {
        AVAILABLE_YEARS.iter().copied().map(Self).collect()
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Period {
    type Err = InvalidPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Accepts `"2023"` from query strings and `2023` from JSON bodies.
impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Year(u16),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Year(year) => Self::parse(&year.to_string()),
            Raw::Text(raw) => Self::parse(&raw),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// Error returned when a string is not a 4-digit year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPeriodError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for InvalidPeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid period {:?}: expected a 4-digit year", self.input)
    }
}

impl std::error::Error for InvalidPeriodError {}
