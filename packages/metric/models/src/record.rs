//! Flat code → value records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw value as returned by the upstream: a numeric-looking string, a
/// numeric literal, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Numeric literal.
    Number(f64),
    /// String cell, usually numeric-looking.
    Text(String),
    /// No data.
    Null,
}

impl RawValue {
    /// Converts one cell of an upstream JSON table into a raw value.
    ///
    /// Booleans, arrays and objects are not expected in statistics tables;
    /// they are kept as their JSON text so nothing is silently dropped.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            other => Self::Text(other.to_string()),
        }
    }

    /// Returns `true` for the values displayed as "no data": null, the
    /// empty string and `"-"`.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => {
                let s = s.trim();
                s.is_empty() || s == "-"
            }
            Self::Number(_) => false,
        }
    }

    /// Parses the value as a finite number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Null => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for RawValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Metric code → raw value for one geography and period.
///
/// A code that is absent means "no data", never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(BTreeMap<String, RawValue>);

impl FlatRecord {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value for `code`, if the upstream returned one.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&RawValue> {
        self.0.get(code)
    }

    /// Returns `true` if `code` is present.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    /// Inserts a value. A later insert for the same code replaces the
    /// earlier one.
    pub fn insert(&mut self, code: impl Into<String>, value: RawValue) {
        self.0.insert(code.into(), value);
    }

    /// Moves every entry of `other` into this record. Values from `other`
    /// win on duplicate codes.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Number of codes present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no codes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(code, value)` pairs in sorted code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, RawValue)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, RawValue)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (&'a str, RawValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}
