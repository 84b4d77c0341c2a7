//! Run-scoped transfer statistics.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome tally for one transfer run.
///
/// Created per run and passed explicitly into the engine; atomic counters
/// let the CLI's progress ticker read totals while the run is in flight.
#[derive(Debug, Default)]
pub struct TransferStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl TransferStats {
    /// Creates a new tally with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of links saved successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Returns the number of links that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the number of links skipped (no adapter registered).
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Returns the total number of links handled this run.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded() + self.failed() + self.skipped()
    }

    pub(crate) fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
}
