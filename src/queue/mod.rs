//! Persistent, deduplicating work queue for harvested share links.
//!
//! SQLite-backed storage for links moving through their transfer lifecycle
//! (pending → processing → completed/failed). The natural key is
//! `(url, origin)`: re-inserting a link already seen from the same origin is
//! a silent no-op, so the extractor can be as noisy as it likes.
//!
//! Every operation here is a single self-contained statement or transaction.
//! No transaction ever spans a provider call, so slow network I/O can never
//! hold a database lock.
//!
//! # Example
//!
//! ```ignore
//! use pansaver_core::queue::{LinkQueue, LinkStatus};
//! use pansaver_core::Database;
//!
//! let db = Database::new(Path::new("links.db")).await?;
//! let queue = LinkQueue::new(db);
//!
//! let stored = queue.insert(&links).await?;
//! let batch = queue.pull_pending(20).await?;
//! ```

mod error;
mod item;

pub use error::{QueueDbErrorKind, QueueError};
pub use item::{LinkOrigin, LinkRecord, LinkStatus, NewLink};

pub(crate) use item::unix_now;

use sqlx::Row;
use tracing::instrument;

use crate::db::Database;
use crate::extractor::Platform;

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Returns `Ok(())` if at least one row was affected; otherwise [`QueueError::LinkNotFound`].
fn check_affected(id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(QueueError::LinkNotFound(id))
    } else {
        Ok(())
    }
}

/// Queue manager for harvested links.
#[derive(Debug, Clone)]
pub struct LinkQueue {
    db: Database,
}

impl LinkQueue {
    /// Creates a new queue manager with the given database connection.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a batch of links, skipping any whose `(url, origin)` key is
    /// already stored.
    ///
    /// Dedup collisions are success-no-ops, not errors. Returns the number
    /// of newly stored rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the insert fails for any reason
    /// other than the expected uniqueness no-op, or
    /// [`QueueError::OriginMeta`] if origin metadata cannot be encoded.
    #[instrument(skip(self, links), fields(batch = links.len()))]
    pub async fn insert(&self, links: &[NewLink]) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        let mut stored = 0u64;

        for link in links {
            let origin_meta = serde_json::to_string(&link.origin)
                .map_err(|e| QueueError::OriginMeta(e.to_string()))?;

            let result = sqlx::query(
                r"INSERT OR IGNORE INTO links (
                    platform,
                    url,
                    password,
                    title,
                    size_hint,
                    origin,
                    origin_meta,
                    extracted_at,
                    status
                  )
                  VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(link.platform.as_str())
            .bind(&link.url)
            .bind(link.password.as_deref())
            .bind(&link.title)
            .bind(link.size_hint.as_deref())
            .bind(link.origin.key())
            .bind(origin_meta)
            .bind(link.extracted_at)
            .bind(LinkStatus::Pending.as_str())
            .execute(&mut *tx)
            .await?;

            stored += result.rows_affected();
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// Returns up to `limit` pending links, most recently created first.
    ///
    /// This is deliberately a plain read: records are claimed by a separate
    /// [`mark_processing`](Self::mark_processing) write. Two processes
    /// running against the same store can observe the same batch; single
    /// instance operation is assumed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn pull_pending(&self, limit: i64) -> Result<Vec<LinkRecord>> {
        let records = sqlx::query_as::<_, LinkRecord>(
            r"SELECT * FROM links
              WHERE status = ?
              ORDER BY created_at DESC, id DESC
              LIMIT ?",
        )
        .bind(LinkStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }

    /// Marks a link as currently being transferred.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::LinkNotFound`] if no link exists with the given ID.
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn mark_processing(&self, id: i64) -> Result<()> {
        self.set_status(id, LinkStatus::Processing, None).await
    }

    /// Marks a link as successfully transferred.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::LinkNotFound`] if no link exists with the given ID.
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn mark_completed(&self, id: i64) -> Result<()> {
        self.set_status(id, LinkStatus::Completed, None).await
    }

    /// Marks a link as failed with an error message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::LinkNotFound`] if no link exists with the given ID.
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self), fields(error = %error))]
    pub async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        self.set_status(id, LinkStatus::Failed, Some(error)).await
    }

    /// Single-row status write. No transition validation happens here: the
    /// transfer engine is the sole caller and is trusted to respect the
    /// state machine.
    async fn set_status(&self, id: i64, status: LinkStatus, error: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE links
              SET status = ?,
                  last_error = COALESCE(?, last_error),
                  updated_at = datetime('now')
              WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(error)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        check_affected(id, result.rows_affected())
    }

    /// Gets a link record by ID.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<LinkRecord>> {
        let record = sqlx::query_as::<_, LinkRecord>(r"SELECT * FROM links WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record)
    }

    /// Counts links with the given status.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn count_by_status(&self, status: LinkStatus) -> Result<i64> {
        let result = sqlx::query(r"SELECT COUNT(*) as count FROM links WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(self.db.pool())
            .await?;

        Ok(result.get("count"))
    }

    /// Returns per-status counts for monitoring collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn status_counts(&self) -> Result<Vec<(LinkStatus, i64)>> {
        let rows = sqlx::query(r"SELECT status, COUNT(*) as count FROM links GROUP BY status")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let status: String = row.get("status");
                let count: i64 = row.get("count");
                status.parse::<LinkStatus>().ok().map(|s| (s, count))
            })
            .collect())
    }

    /// Returns per-platform counts for monitoring collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn platform_counts(&self) -> Result<Vec<(Platform, i64)>> {
        let rows = sqlx::query(r"SELECT platform, COUNT(*) as count FROM links GROUP BY platform")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let platform: String = row.get("platform");
                let count: i64 = row.get("count");
                platform.parse::<Platform>().ok().map(|p| (p, count))
            })
            .collect())
    }

    /// Counts links extracted at or after the given unix time.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn extracted_since(&self, cutoff: i64) -> Result<i64> {
        let result = sqlx::query(r"SELECT COUNT(*) as count FROM links WHERE extracted_at >= ?")
            .bind(cutoff)
            .fetch_one(self.db.pool())
            .await?;

        Ok(result.get("count"))
    }

    /// Lists links filtered by status, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_status(&self, status: LinkStatus) -> Result<Vec<LinkRecord>> {
        let records = sqlx::query_as::<_, LinkRecord>(
            r"SELECT * FROM links
              WHERE status = ?
              ORDER BY created_at DESC, id DESC",
        )
        .bind(status.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }

    /// Returns all `processing` rows to `pending`.
    ///
    /// Operator path for records stranded by an interrupted run. The
    /// transfer engine never calls this; nothing returns `failed` rows to
    /// the queue automatically.
    ///
    /// # Returns
    ///
    /// The number of rows reset.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn reset_processing(&self) -> Result<u64> {
        let result = sqlx::query(
            r"UPDATE links
              SET status = ?, updated_at = datetime('now')
              WHERE status = ?",
        )
        .bind(LinkStatus::Pending.as_str())
        .bind(LinkStatus::Processing.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
