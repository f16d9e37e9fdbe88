//! American Community Survey source.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric::MetricCatalog;
use census_explorer_metric_models::{Dataset, FlatRecord, MetricSource, Period};

use crate::batch::{CHUNK_LIMIT, ChunkTransport, chunk_count, fetch_batched};
use crate::progress::{ProgressCallback, null_progress};
use crate::{DataSource, SourceError};

/// ACS 5-year estimates, fetched in chunks through a [`ChunkTransport`].
///
/// Codes are grouped by table family first, since one request cannot mix
/// detailed tables and data profiles, and each group is then fetched in
/// chunks. Groups are fetched one after another.
pub struct AcsSource<T> {
    transport: T,
    catalog: Arc<MetricCatalog>,
    progress: Arc<dyn ProgressCallback>,
}

impl<T: ChunkTransport> AcsSource<T> {
    /// Creates a source. The catalog resolves each code's table family.
    #[must_use]
    pub fn new(transport: T, catalog: Arc<MetricCatalog>) -> Self {
        Self {
            transport,
            catalog,
            progress: null_progress(),
        }
    }

    /// Reports one progress unit per completed chunk to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn group_by_dataset(&self, codes: &[String]) -> BTreeMap<Dataset, Vec<String>> {
        let mut groups: BTreeMap<Dataset, Vec<String>> = BTreeMap::new();
        for code in codes {
            let dataset = self
                .catalog
                .get(code)
                .map_or_else(|| Dataset::for_code(code), |m| m.dataset());
            groups.entry(dataset).or_default().push(code.clone());
        }
        groups
    }
}

#[async_trait]
impl<T: ChunkTransport> DataSource for AcsSource<T> {
    fn id(&self) -> &str {
        "acs"
    }

    fn name(&self) -> &str {
        "American Community Survey 5-year estimates"
    }

    fn kind(&self) -> MetricSource {
        MetricSource::Acs
    }

    async fn fetch(
        &self,
        zip: &ZipCode,
        period: Period,
        codes: &[String],
    ) -> Result<FlatRecord, SourceError> {
        let groups = self.group_by_dataset(codes);
        let total: usize = groups
            .values()
            .map(|g| chunk_count(g.len(), CHUNK_LIMIT))
            .sum();
        self.progress.set_total(total as u64);
        self.progress
            .set_message(format!("ACS {period} for {zip}"));

        let mut record = FlatRecord::new();
        for (dataset, group) in &groups {
            let partial = fetch_batched(
                &self.transport,
                zip,
                period,
                *dataset,
                group,
                &self.progress,
            )
            .await?;
            record.merge(partial);
        }

        self.progress
            .finish(format!("ACS {period}: {} values", record.len()));
        Ok(record)
    }
}
