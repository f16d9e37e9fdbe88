//! Chunked retrieval of long metric code lists.
//!
//! The upstream caps the number of fields per call. [`fetch_batched`]
//! splits a code list into consecutive chunks of at most [`CHUNK_LIMIT`]
//! codes and issues one request per chunk, sequentially, because the
//! upstream is rate-sensitive. Chunks request disjoint code sets, so the
//! merged record does not depend on the order results arrive in.

use std::sync::Arc;

use async_trait::async_trait;
use census_explorer_geography_models::ZipCode;
use census_explorer_metric_models::{Dataset, FlatRecord, Period};

use crate::SourceError;
use crate::progress::ProgressCallback;
use crate::table::parse_table;

/// Maximum number of metric codes per upstream request.
pub const CHUNK_LIMIT: usize = 50;

/// One chunk request: a geography, a period, a dataset and at most
/// [`CHUNK_LIMIT`] codes.
#[derive(Debug, Clone, Copy)]
pub struct ChunkRequest<'a> {
    /// Geography identifier.
    pub zip: &'a ZipCode,
    /// Dataset vintage.
    pub period: Period,
    /// ACS table family all `codes` belong to.
    pub dataset: Dataset,
    /// Codes requested in this chunk.
    pub codes: &'a [String],
}

/// Issues a single chunk request and returns the raw response body.
///
/// Implementations map non-success statuses to
/// [`SourceError::Upstream`]. Table decoding is left to the caller so
/// every transport is validated the same way.
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// Performs one request.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the upstream
    /// answers with a non-success status.
    async fn fetch_chunk(
        &self,
        request: &ChunkRequest<'_>,
    ) -> Result<serde_json::Value, SourceError>;
}

/// Number of requests needed for `len` codes at `limit` codes per request.
#[must_use]
pub const fn chunk_count(len: usize, limit: usize) -> usize {
    let limit = if limit == 0 { 1 } else { limit };
    len.div_ceil(limit)
}

/// Fetches `codes` in chunks of [`CHUNK_LIMIT`]. See
/// [`fetch_batched_with_limit`].
///
/// # Errors
///
/// Returns [`SourceError`] if any chunk request fails.
pub async fn fetch_batched(
    transport: &dyn ChunkTransport,
    zip: &ZipCode,
    period: Period,
    dataset: Dataset,
    codes: &[String],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<FlatRecord, SourceError> {
    fetch_batched_with_limit(transport, zip, period, dataset, codes, CHUNK_LIMIT, progress).await
}

/// Fetches `codes` in chunks of at most `limit`, one request at a time,
/// and merges the results into one record.
///
/// Codes the upstream omits are simply absent from the result. An empty
/// code list issues no request. Progress advances by one per completed
/// chunk; the caller sets the total.
///
/// # Errors
///
/// Returns [`SourceError`] as soon as any chunk fails (non-success status,
/// malformed body, or fewer than two rows). Results from earlier chunks
/// are discarded.
pub async fn fetch_batched_with_limit(
    transport: &dyn ChunkTransport,
    zip: &ZipCode,
    period: Period,
    dataset: Dataset,
    codes: &[String],
    limit: usize,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<FlatRecord, SourceError> {
    let limit = limit.max(1);
    let total = chunk_count(codes.len(), limit);
    let mut record = FlatRecord::new();

    for (i, chunk) in codes.chunks(limit).enumerate() {
        log::debug!(
            "[{zip}/{period}] Chunk {}/{total}: {} {dataset} codes",
            i + 1,
            chunk.len()
        );

        let request = ChunkRequest {
            zip,
            period,
            dataset,
            codes: chunk,
        };
        let body = transport.fetch_chunk(&request).await.inspect_err(|e| {
            log::warn!("[{zip}/{period}] Chunk {}/{total} failed: {e}", i + 1);
        })?;
        record.merge(parse_table(&body)?);
        progress.inc(1);
    }

    log::info!(
        "[{zip}/{period}] Retrieved {} of {} {dataset} codes in {total} request(s)",
        record.len(),
        codes.len()
    );

    Ok(record)
}
