//! ZIP Code Business Patterns stand-in.
//!
//! The business-pattern dataset is not wired to a live upstream. This source
//! serves plausible values derived from a SHA-256 digest of the ZIP code,
//! period and metric code, so the same request always yields the same
//! record and nothing random leaks into the core.

use async_trait::async_trait;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::{FlatRecord, MetricSource, Period, RawValue};
use sha2::{Digest as _, Sha256};

use crate::{DataSource, SourceError};

/// Business establishments.
pub const ZBP_ESTABLISHMENTS: &str = "ZBP_ESTAB";
/// Paid employees.
pub const ZBP_EMPLOYEES: &str = "ZBP_EMP";
/// Annual payroll in thousands of dollars.
pub const ZBP_ANNUAL_PAYROLL: &str = "ZBP_PAYANN";

/// `(code, minimum, span)`: values fall in `minimum..minimum + span`.
const RANGES: &[(&str, u64, u64)] = &[
    (ZBP_ESTABLISHMENTS, 50, 500),
    (ZBP_EMPLOYEES, 200, 2_000),
    (ZBP_ANNUAL_PAYROLL, 10_000, 50_000),
];

/// Deterministic stand-in for the business-pattern dataset.
#[derive(Debug, Default, Clone, Copy)]
pub struct BusinessPatternSource;

impl BusinessPatternSource {
    /// Creates the source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Derives a value in `minimum..minimum + span` from the request identity.
fn synthetic_value(zip: &ZipCode, period: Period, code: &str, minimum: u64, span: u64) -> u64 {
    let digest = Sha256::digest(format!("{zip}:{period}:{code}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    minimum + u64::from_be_bytes(bytes) % span
}

#[async_trait]
impl DataSource for BusinessPatternSource {
    fn id(&self) -> &str {
        "zbp"
    }

    fn name(&self) -> &str {
        "ZIP Code Business Patterns"
    }

    fn kind(&self) -> MetricSource {
        MetricSource::Zbp
    }

    async fn fetch(
        &self,
        zip: &ZipCode,
        period: Period,
        codes: &[String],
    ) -> Result<FlatRecord, SourceError> {
        Ok(codes
            .iter()
            .filter_map(|code| {
                RANGES
                    .iter()
                    .find(|(known, _, _)| *known == code.as_str())
                    .map(|&(_, minimum, span)| {
                        let value = synthetic_value(zip, period, code, minimum, span);
                        (code.clone(), RawValue::from(value))
                    })
            })
            .collect())
    }
}
