//! Progress reporting for chunked fetches.
//!
//! Decouples chunk progress from any rendering backend. The CLI plugs in
//! `indicatif` bars; servers and tests use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates, one unit per completed chunk request.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// concurrently running period fetches.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of chunk requests expected.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` completed requests.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
