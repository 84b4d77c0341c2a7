//! Provider adapters for saving shared resources into the user's account.
//!
//! Every adapter is polymorphic over the same three-step capability set:
//! resolve the share into a session, list one bounded page of its contents,
//! and copy the listed files to the destination. Two strategies exist:
//!
//! - [`QuarkAdapter`] - direct token-exchange protocol against the
//!   provider's private API
//! - [`BrowserAdapter`] - WebDriver UI automation for providers without a
//!   usable API
//!
//! Adapters are resolved per item through the [`AdapterRegistry`] keyed by
//! [`Platform`].

mod browser;
mod error;
mod http;
mod quark;
mod registry;

pub use browser::{BrowserAdapter, BrowserSteps};
pub use error::ProviderError;
pub use quark::QuarkAdapter;
pub use registry::AdapterRegistry;

use async_trait::async_trait;

use crate::extractor::Platform;
use crate::queue::LinkRecord;

/// Maximum entries in one listing page. Descriptors beyond the first page
/// are not retrieved.
pub const LISTING_PAGE_SIZE: usize = 50;

/// A share link handed to an adapter for transfer.
#[derive(Debug, Clone)]
pub struct ShareLink {
    /// Platform the share belongs to.
    pub platform: Platform,
    /// Share URL.
    pub url: String,
    /// Access password, when the share is protected.
    pub password: Option<String>,
}

impl ShareLink {
    /// Builds a share link from a queue record, when its platform tag is
    /// recognized.
    #[must_use]
    pub fn from_record(record: &LinkRecord) -> Option<Self> {
        record.platform().map(|platform| Self {
            platform,
            url: record.url.clone(),
            password: record.password.clone(),
        })
    }
}

/// A resolved share session. Short-lived: valid for the single transfer
/// attempt that produced it and never persisted.
#[derive(Debug, Clone)]
pub struct ShareSession {
    /// The share URL the session was resolved from.
    pub url: String,
    /// Share identifier parsed from the URL.
    pub pwd_id: String,
    /// Passcode used to resolve the share (may be empty).
    pub passcode: String,
    /// Session token obtained from the provider (empty for UI automation).
    pub stoken: String,
}

/// A listed file's id and file-scoped token needed to authorize copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Provider file id.
    pub fid: String,
    /// File-scoped share token.
    pub share_fid_token: String,
    /// Provider file-type tag (0 = directory on most platforms).
    pub file_type: i64,
}

/// One bounded page of a share's contents.
#[derive(Debug, Clone)]
pub struct ShareListing {
    /// Share title as reported by the provider.
    pub title: String,
    /// File descriptors, at most [`LISTING_PAGE_SIZE`] entries.
    pub files: Vec<FileDescriptor>,
}

/// Capability set every provider adapter implements.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn ProviderAdapter>`. Rust 2024 native async traits are not
/// object-safe, so `async_trait` is required for the registry pattern.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Returns the adapter's name (e.g. "quark", "browser").
    fn name(&self) -> &'static str;

    /// Returns the platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Resolves a share link into a short-lived session.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Auth`] when the provider rejects the
    /// passcode or none was supplied for a protected share.
    async fn resolve_share(&self, share: &ShareLink) -> Result<ShareSession, ProviderError>;

    /// Lists one bounded page of the share's contents.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::EmptyShare`] when the share lists no files.
    async fn list_contents(&self, session: &ShareSession) -> Result<ShareListing, ProviderError>;

    /// Copies the listed files into the destination folder of the user's
    /// account. Re-copying already-saved files is expected to be a
    /// provider-side no-op; the adapter does not verify this.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing the failed step.
    async fn copy_to_account(
        &self,
        session: &ShareSession,
        files: &[FileDescriptor],
        destination: &str,
    ) -> Result<(), ProviderError>;
}

/// Extracts the share identifier from a share URL.
///
/// Most platforms embed it as the path segment after `/s/`
/// (`https://pan.quark.cn/s/<pwd_id>?query`); Tianyi uses `/t/<id>`. The
/// query string never participates.
pub(crate) fn parse_pwd_id(share_url: &str) -> Result<String, ProviderError> {
    let parsed = url::Url::parse(share_url).map_err(|e| ProviderError::InvalidShareUrl {
        url: share_url.to_string(),
        reason: e.to_string(),
    })?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let pwd_id = match segments.as_slice() {
        [.., marker, id] if *marker == "s" || *marker == "t" => (*id).to_string(),
        [.., last] => (*last).to_string(),
        [] => String::new(),
    };

    if pwd_id.is_empty() {
        return Err(ProviderError::InvalidShareUrl {
            url: share_url.to_string(),
            reason: "no share id in path".to_string(),
        });
    }

    Ok(pwd_id)
}
