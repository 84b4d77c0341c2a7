//! Transfer orchestration: drain pending links through provider adapters.
//!
//! The engine pulls one bounded batch of pending links, walks it strictly
//! sequentially, and drives each link through the adapter registered for
//! its platform: resolve → list → copy. Status transitions follow
//! pending → processing → {completed, failed}; a failing adapter marks only
//! its own link failed and the batch moves on. Queue or audit-log failures
//! are different - once the store is unreliable the run aborts.
//!
//! # Example
//!
//! ```ignore
//! let engine = TransferEngine::new(registry, Pacer::default(), 20, "0".into());
//! let stats = TransferStats::new();
//! engine.process_pending(&queue, &audit, &stats).await?;
//! println!("saved {}, failed {}", stats.succeeded(), stats.failed());
//! ```

mod audit;
mod pacer;
mod stats;

pub use audit::{AuditEntry, AuditError, AuditLog, AuditOutcome};
pub use pacer::{DEFAULT_ITEM_DELAY, DEFAULT_REST_DELAY, DEFAULT_REST_EVERY, Pacer};
pub use stats::TransferStats;

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::provider::{AdapterRegistry, ProviderAdapter, ProviderError, ShareLink};
use crate::queue::{LinkQueue, LinkRecord, QueueError};

/// Default batch size pulled per run.
pub const DEFAULT_BATCH_LIMIT: i64 = 20;

/// Error type for transfer engine runs.
///
/// Adapter failures never appear here - they are per-item outcomes. Only
/// persistence problems abort a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Queue operation failed.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Audit log write failed.
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
}

/// Sequential transfer engine over a registry of provider adapters.
#[derive(Debug)]
pub struct TransferEngine {
    registry: AdapterRegistry,
    pacer: Pacer,
    batch_limit: i64,
    destination: String,
}

impl TransferEngine {
    /// Creates an engine.
    ///
    /// `destination` is the provider-side folder id files are copied into
    /// (`"0"` is the root folder on every supported platform).
    #[must_use]
    pub fn new(
        registry: AdapterRegistry,
        pacer: Pacer,
        batch_limit: i64,
        destination: String,
    ) -> Self {
        Self {
            registry,
            pacer,
            batch_limit,
            destination,
        }
    }

    /// Returns the configured batch limit.
    #[must_use]
    pub fn batch_limit(&self) -> i64 {
        self.batch_limit
    }

    /// Processes one batch of pending links.
    ///
    /// Items are handled in the order `pull_pending` returns them
    /// (most-recent-first), exactly one at a time. Each item is claimed
    /// with a `processing` write before its adapter runs and receives a
    /// terminal status afterwards. Links whose platform has no registered
    /// adapter are counted skipped and stay pending.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for queue or audit-log failures; adapter
    /// failures are recorded per item and never abort the batch.
    #[instrument(skip_all, fields(batch_limit = self.batch_limit))]
    pub async fn process_pending(
        &self,
        queue: &LinkQueue,
        audit: &AuditLog,
        stats: &TransferStats,
    ) -> Result<(), EngineError> {
        let batch = queue.pull_pending(self.batch_limit).await?;
        if batch.is_empty() {
            info!("no pending links");
            return Ok(());
        }

        info!(batch = batch.len(), "starting transfer batch");
        let mut handled = 0usize;

        for record in batch {
            let adapter = record
                .platform()
                .and_then(|platform| self.registry.adapter_for(platform));

            let Some(adapter) = adapter else {
                warn!(
                    id = record.id,
                    platform = %record.platform_str,
                    "no adapter registered; leaving pending"
                );
                stats.increment_skipped();
                audit.record(&AuditEntry::skipped(&record))?;
                continue;
            };

            queue.mark_processing(record.id).await?;
            debug!(id = record.id, adapter = adapter.name(), url = %record.url, "transferring");

            let started = Instant::now();
            let outcome = transfer_one(adapter, &record, &self.destination).await;
            let duration = started.elapsed();

            match outcome {
                Ok(files) => {
                    queue.mark_completed(record.id).await?;
                    stats.increment_succeeded();
                    audit.record(&AuditEntry::success(&record, duration))?;
                    info!(
                        id = record.id,
                        files,
                        duration_ms = duration.as_millis(),
                        "transfer completed"
                    );
                }
                Err(error) => {
                    let message = error.to_string();
                    queue.mark_failed(record.id, &message).await?;
                    stats.increment_failed();
                    audit.record(&AuditEntry::failed(&record, &message, duration))?;
                    warn!(
                        id = record.id,
                        url = %record.url,
                        error = %message,
                        "transfer failed; continuing batch"
                    );
                }
            }

            handled += 1;
            self.pacer.pause(handled).await;
        }

        info!(
            succeeded = stats.succeeded(),
            failed = stats.failed(),
            skipped = stats.skipped(),
            "transfer batch complete"
        );
        Ok(())
    }
}

/// Runs the three-step protocol for one link. Returns the number of file
/// descriptors copied (zero for UI-automation adapters, which save the
/// whole share through page controls).
async fn transfer_one(
    adapter: &dyn ProviderAdapter,
    record: &LinkRecord,
    destination: &str,
) -> Result<usize, ProviderError> {
    let share = ShareLink::from_record(record).ok_or_else(|| ProviderError::InvalidShareUrl {
        url: record.url.clone(),
        reason: format!("unrecognized platform tag {}", record.platform_str),
    })?;

    let session = adapter.resolve_share(&share).await?;
    let listing = adapter.list_contents(&session).await?;
    adapter
        .copy_to_account(&session, &listing.files, destination)
        .await?;

    Ok(listing.files.len())
}
