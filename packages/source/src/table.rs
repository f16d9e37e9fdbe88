//! Two-row table decoding.
//!
//! The statistics API answers every request with a JSON array of arrays:
//!
//! ```text
//! [["DP04_0001E","B25064_001E","zip code tabulation area"],
//!  ["12345","1834","10001"]]
//! ```
//!
//! Row 0 holds the field names, row 1 the matching values. The geography
//! column echoes the query and is not a metric, so it is dropped.

use census_explorer_metric_models::{FlatRecord, RawValue};

use crate::SourceError;

/// Name of the geography column echoed back in every response.
pub const GEOGRAPHY_FIELD: &str = "zip code tabulation area";

/// Decodes a two-row table into a [`FlatRecord`].
///
/// If a field name appears more than once, the last value wins. Rows past
/// the second are ignored, since a single ZIP code yields a single row.
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] if the body is not an array of at
/// least two arrays, if a field name is not a string, or if the value row
/// is shorter than the header row.
pub fn parse_table(body: &serde_json::Value) -> Result<FlatRecord, SourceError> {
    let rows = body.as_array().ok_or_else(|| SourceError::Malformed {
        message: "expected a JSON array of rows".to_string(),
    })?;

    if rows.len() < 2 {
        return Err(SourceError::Malformed {
            message: "No data returned from Census API".to_string(),
        });
    }

    let header = rows[0].as_array().ok_or_else(|| SourceError::Malformed {
        message: "header row is not an array".to_string(),
    })?;
    let values = rows[1].as_array().ok_or_else(|| SourceError::Malformed {
        message: "value row is not an array".to_string(),
    })?;

    if values.len() < header.len() {
        return Err(SourceError::Malformed {
            message: format!(
                "value row has {} cells but header has {} fields",
                values.len(),
                header.len()
            ),
        });
    }

    let mut record = FlatRecord::new();
    for (field, value) in header.iter().zip(values) {
        let name = field.as_str().ok_or_else(|| SourceError::Malformed {
            message: format!("field name {field} is not a string"),
        })?;
        if name == GEOGRAPHY_FIELD {
            continue;
        }
        record.insert(name, RawValue::from_json(value));
    }

    Ok(record)
}

/// Builds a two-row table body from field/value pairs, appending the
/// geography column. Used by fixtures to mimic the upstream.
#[must_use]
pub fn build_table<'a>(
    fields: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    zip: &str,
) -> serde_json::Value {
    let (mut header, mut values): (Vec<serde_json::Value>, Vec<serde_json::Value>) = fields
        .into_iter()
        .map(|(name, value)| (serde_json::Value::String(name.to_string()), value))
        .unzip();
    header.push(serde_json::Value::String(GEOGRAPHY_FIELD.to_string()));
    values.push(serde_json::Value::String(zip.to_string()));
    serde_json::Value::Array(vec![
        serde_json::Value::Array(header),
        serde_json::Value::Array(values),
    ])
}
