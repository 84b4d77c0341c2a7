//! Queue record types, status, and origin definitions.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::extractor::{LinkCandidate, Platform};

/// Status of a harvested link in the transfer lifecycle.
///
/// Transitions are monotone: pending → processing → {completed, failed}.
/// Only the transfer engine writes status; `failed` is terminal absent
/// manual intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Waiting to be transferred.
    Pending,
    /// Currently being transferred.
    Processing,
    /// Successfully saved to the destination account.
    Completed,
    /// Transfer failed; terminal.
    Failed,
}

impl LinkStatus {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Processing, Self::Completed, Self::Failed];
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid link status: {s}")),
        }
    }
}

/// Where a harvested link came from.
///
/// The queue treats the metadata as opaque pass-through; only the dedup key
/// derived from it participates in the `(url, origin)` natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LinkOrigin {
    /// A monitored chat message.
    ChatMessage {
        /// Channel/group identifier.
        channel_id: i64,
        /// Message identifier within the channel.
        message_id: i64,
        /// Sender identifier.
        sender_id: i64,
        /// Sender display name, when known.
        sender_name: Option<String>,
    },
    /// A scraped web page.
    PageScrape {
        /// URL of the page the text was scraped from.
        source_url: String,
    },
}

impl LinkOrigin {
    /// Returns the dedup key stored in the `origin` column.
    ///
    /// Chat links deduplicate per channel (re-posts of the same link in the
    /// same channel collapse); scraped links deduplicate per source page.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::ChatMessage { channel_id, .. } => format!("chat:{channel_id}"),
            Self::PageScrape { source_url } => format!("page:{source_url}"),
        }
    }
}

/// A candidate ready for insertion into the queue.
#[derive(Debug, Clone)]
pub struct NewLink {
    /// Platform the share belongs to.
    pub platform: Platform,
    /// Share URL.
    pub url: String,
    /// Access password, when extracted.
    pub password: Option<String>,
    /// Derived title (or the "unknown" sentinel).
    pub title: String,
    /// Declared file size, when extracted.
    pub size_hint: Option<String>,
    /// Origin metadata.
    pub origin: LinkOrigin,
    /// Unix seconds at extraction time.
    pub extracted_at: i64,
}

impl NewLink {
    /// Builds an insertable link from an extractor candidate and its origin.
    #[must_use]
    pub fn from_candidate(candidate: LinkCandidate, origin: LinkOrigin) -> Self {
        Self {
            platform: candidate.platform,
            url: candidate.url,
            password: candidate.password,
            title: candidate.title,
            size_hint: candidate.size_hint,
            origin,
            extracted_at: unix_now(),
        }
    }
}

/// Current unix time in seconds.
#[must_use]
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// A stored queue record.
#[derive(Debug, Clone, FromRow)]
pub struct LinkRecord {
    /// Unique identifier.
    pub id: i64,
    /// Platform tag (stored as text, parsed via `platform()`).
    #[sqlx(rename = "platform")]
    pub platform_str: String,
    /// Share URL.
    pub url: String,
    /// Access password, when any.
    pub password: Option<String>,
    /// Derived title.
    pub title: String,
    /// Declared file size, when any.
    pub size_hint: Option<String>,
    /// Origin dedup key (`chat:{channel}` or `page:{url}`).
    #[sqlx(rename = "origin")]
    pub origin_key: String,
    /// Full origin metadata as JSON pass-through.
    pub origin_meta: Option<String>,
    /// Unix seconds at extraction time.
    pub extracted_at: i64,
    /// Current lifecycle status (stored as text, parsed via `status()`).
    #[sqlx(rename = "status")]
    pub status_str: String,
    /// Last transfer error, when failed.
    pub last_error: Option<String>,
    /// When the record was created.
    pub created_at: String,
    /// When the record was last updated.
    pub updated_at: String,
}

impl LinkRecord {
    /// Returns the parsed status enum.
    ///
    /// Falls back to `Pending` if the status string is invalid.
    #[must_use]
    pub fn status(&self) -> LinkStatus {
        self.status_str.parse().unwrap_or(LinkStatus::Pending)
    }

    /// Returns the parsed platform tag, when recognized.
    ///
    /// An unrecognized tag yields `None`; the transfer engine skips such
    /// records instead of guessing an adapter.
    #[must_use]
    pub fn platform(&self) -> Option<Platform> {
        self.platform_str.parse().ok()
    }

    /// Returns the decoded origin metadata, when present and well-formed.
    #[must_use]
    pub fn origin(&self) -> Option<LinkOrigin> {
        self.origin_meta
            .as_deref()
            .and_then(|meta| serde_json::from_str(meta).ok())
    }
}

impl fmt::Display for LinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinkRecord {{ id: {}, platform: {}, url: {}, status: {} }}",
            self.id,
            self.platform_str,
            self.url,
            self.status()
        )
    }
}
