//! In-memory sources for tests and offline demos.
//!
//! [`FixtureTransport`] stands in for the upstream at the chunk level and
//! records every request it receives. [`FixtureSource`] stands in for a
//! whole [`DataSource`] and serves prepared records per ZIP code and
//! period.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::{Dataset, FlatRecord, MetricSource, Period};

use crate::batch::{ChunkRequest, ChunkTransport};
use crate::table::build_table;
use crate::{DataSource, SourceError};

/// Value served for codes without a prepared value.
const DEFAULT_FIXTURE_VALUE: &str = "100";

/// A chunk request as seen by [`FixtureTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChunk {
    /// Geography identifier.
    pub zip: ZipCode,
    /// Dataset vintage.
    pub period: Period,
    /// ACS table family.
    pub dataset: Dataset,
    /// Requested codes.
    pub codes: Vec<String>,
}

/// Chunk transport that answers from memory.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    values: BTreeMap<String, serde_json::Value>,
    omitted: BTreeSet<String>,
    fail_on_call: Option<usize>,
    requests: Mutex<Vec<RecordedChunk>>,
}

impl FixtureTransport {
    /// Creates a transport that answers every code with a default value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `value` for `code`.
    #[must_use]
    pub fn with_value(mut self, code: &str, value: serde_json::Value) -> Self {
        self.values.insert(code.to_string(), value);
        self
    }

    /// Leaves `codes` out of every response, like the upstream does for
    /// fields it has no estimate for.
    #[must_use]
    pub fn omitting<'a>(mut self, codes: impl IntoIterator<Item = &'a str>) -> Self {
        self.omitted.extend(codes.into_iter().map(String::from));
        self
    }

    /// Fails the `call`-th request (1-based) with an upstream 500.
    #[must_use]
    pub const fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedChunk> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChunkTransport for FixtureTransport {
    async fn fetch_chunk(
        &self,
        request: &ChunkRequest<'_>,
    ) -> Result<serde_json::Value, SourceError> {
        let call = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(RecordedChunk {
                zip: request.zip.clone(),
                period: request.period,
                dataset: request.dataset,
                codes: request.codes.to_vec(),
            });
            requests.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(SourceError::Upstream {
                status: 500,
                message: "fixture failure".to_string(),
            });
        }

        let fields = request
            .codes
            .iter()
            .filter(|code| !self.omitted.contains(*code))
            .map(|code| {
                let value = self.values.get(code).cloned().unwrap_or_else(|| {
                    serde_json::Value::String(DEFAULT_FIXTURE_VALUE.to_string())
                });
                (code.as_str(), value)
            });

        Ok(build_table(fields, request.zip.as_str()))
    }
}

/// Data source that serves prepared records.
pub struct FixtureSource {
    id: String,
    kind: MetricSource,
    records: BTreeMap<(ZipCode, Period), FlatRecord>,
    failing: BTreeSet<Period>,
    delays: BTreeMap<ZipCode, Duration>,
    calls: AtomicUsize,
}

impl FixtureSource {
    /// Creates an empty fixture serving codes of `kind`.
    #[must_use]
    pub fn new(kind: MetricSource) -> Self {
        Self {
            id: format!("fixture_{}", kind.as_ref().to_lowercase()),
            kind,
            records: BTreeMap::new(),
            failing: BTreeSet::new(),
            delays: BTreeMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serves `record` for `zip` and `period`.
    #[must_use]
    pub fn with_record(mut self, zip: &ZipCode, period: Period, record: FlatRecord) -> Self {
        self.records.insert((zip.clone(), period), record);
        self
    }

    /// Fails every fetch for `period` with an upstream 500.
    #[must_use]
    pub fn failing_period(mut self, period: Period) -> Self {
        self.failing.insert(period);
        self
    }

    /// Sleeps for `delay` before answering fetches for `zip`.
    #[must_use]
    pub fn with_delay(mut self, zip: &ZipCode, delay: Duration) -> Self {
        self.delays.insert(zip.clone(), delay);
        self
    }

    /// Number of fetches started so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Fixture data"
    }

    fn kind(&self) -> MetricSource {
        self.kind
    }

    async fn fetch(
        &self,
        zip: &ZipCode,
        period: Period,
        codes: &[String],
    ) -> Result<FlatRecord, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(zip) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&period) {
            return Err(SourceError::Upstream {
                status: 500,
                message: format!("fixture failure for {period}"),
            });
        }

        let Some(record) = self.records.get(&(zip.clone(), period)) else {
            return Ok(FlatRecord::new());
        };

        Ok(codes
            .iter()
            .filter_map(|code| record.get(code).map(|v| (code.clone(), v.clone())))
            .collect())
    }
}
