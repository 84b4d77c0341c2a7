//! Append-only audit log of per-item transfer outcomes.
//!
//! One JSON line per handled link, written as the run progresses, for
//! post-run inspection. Queue status records the terminal state; the audit
//! log keeps the why and how long.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::{LinkRecord, unix_now};

/// Outcome of one handled link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Saved to the destination account.
    Success,
    /// Transfer failed; the error field carries the reason.
    Failed,
    /// No adapter registered for the platform; the record stays pending.
    Skipped,
}

/// One audit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Queue record id.
    pub link_id: i64,
    /// Platform tag as stored.
    pub platform: String,
    /// Share URL.
    pub url: String,
    /// Outcome for this link.
    pub outcome: AuditOutcome,
    /// Failure reason, for failed outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time spent on this link, in milliseconds.
    pub duration_ms: u64,
    /// Unix seconds when the outcome was recorded.
    pub recorded_at: i64,
}

impl AuditEntry {
    /// Builds a success entry.
    #[must_use]
    pub fn success(record: &LinkRecord, duration: Duration) -> Self {
        Self::build(record, AuditOutcome::Success, None, duration)
    }

    /// Builds a failed entry carrying the error text.
    #[must_use]
    pub fn failed(record: &LinkRecord, error: &str, duration: Duration) -> Self {
        Self::build(record, AuditOutcome::Failed, Some(error.to_string()), duration)
    }

    /// Builds a skipped entry.
    #[must_use]
    pub fn skipped(record: &LinkRecord) -> Self {
        Self::build(record, AuditOutcome::Skipped, None, Duration::ZERO)
    }

    fn build(
        record: &LinkRecord,
        outcome: AuditOutcome,
        error: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            link_id: record.id,
            platform: record.platform_str.clone(),
            url: record.url.clone(),
            outcome,
            error,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            recorded_at: unix_now(),
        }
    }
}

/// Errors that can occur while writing the audit log.
#[derive(Debug, Error)]
pub enum AuditError {
    /// I/O failure opening or appending to the log file.
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded.
    #[error("audit entry encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The log writer lock was poisoned by a panicking writer.
    #[error("audit log writer poisoned")]
    Poisoned,
}

/// Append-only JSONL audit log.
#[derive(Debug)]
pub struct AuditLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl AuditLog {
    /// Opens (or creates) the audit log at `path` in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, AuditError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as a JSON line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] on encoding or write failure. The engine
    /// treats this as fatal for the run: an audit trail that silently
    /// drops outcomes is worse than an aborted batch.
    pub fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().map_err(|_| AuditError::Poisoned)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(id: i64) -> LinkRecord {
        LinkRecord {
            id,
            platform_str: "quark".to_string(),
            url: format!("https://pan.quark.cn/s/link{id}"),
            password: None,
            title: "unknown".to_string(),
            size_hint: None,
            origin_key: "chat:1".to_string(),
            origin_meta: None,
            extracted_at: 0,
            status_str: "processing".to_string(),
            last_error: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_record_appends_parseable_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();

        log.record(&AuditEntry::success(&record(1), Duration::from_millis(1200)))
            .unwrap();
        log.record(&AuditEntry::failed(&record(2), "share token refused", Duration::from_millis(300)))
            .unwrap();
        log.record(&AuditEntry::skipped(&record(3))).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.link_id, 1);
        assert_eq!(first.outcome, AuditOutcome::Success);
        assert_eq!(first.duration_ms, 1200);
        assert!(first.error.is_none());

        let second: AuditEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.outcome, AuditOutcome::Failed);
        assert_eq!(second.error.as_deref(), Some("share token refused"));

        let third: AuditEntry = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(third.outcome, AuditOutcome::Skipped);
    }

    #[test]
    fn test_reopen_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let log = AuditLog::open(&path).unwrap();
            log.record(&AuditEntry::skipped(&record(1))).unwrap();
        }
        {
            let log = AuditLog::open(&path).unwrap();
            log.record(&AuditEntry::skipped(&record(2))).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_success_entry_has_no_error_field_in_json() {
        let entry = AuditEntry::success(&record(1), Duration::ZERO);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("\"error\""));
    }
}
