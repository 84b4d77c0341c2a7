//! Share-link extraction from free-form text.
//!
//! The extractor scans a text blob (chat message, scraped page) for netdisk
//! share URLs and pairs every match with the access password, title, and
//! size hint found around it. It is a pure function of its input: no I/O,
//! no side effects, and an unmatched text simply yields no candidates.
//!
//! # Example
//!
//! ```
//! use pansaver_core::extractor::extract;
//!
//! let text = "权游全集 https://pan.quark.cn/s/abcd12 提取码: ab12";
//! let candidates = extract(text);
//! assert_eq!(candidates.len(), 1);
//! assert_eq!(candidates[0].url, "https://pan.quark.cn/s/abcd12");
//! assert_eq!(candidates[0].password.as_deref(), Some("ab12"));
//! ```

mod password;
mod patterns;
mod platform;
mod title;

pub use platform::Platform;
pub use title::UNKNOWN_TITLE;

use tracing::{debug, trace};

/// A candidate share link found in a text blob.
///
/// Candidates are not yet deduplicated; the same link captured by two
/// pattern variants produces two candidates, and the repository collapses
/// them at insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Platform the URL pattern belongs to.
    pub platform: Platform,
    /// The matched share URL, exactly as it appeared in the text.
    pub url: String,
    /// Access password found near the URL, when any.
    pub password: Option<String>,
    /// Title derived from the URL's line, or `"unknown"`.
    pub title: String,
    /// Declared file size found in the text (e.g. "2.5GB"), when any.
    pub size_hint: Option<String>,
}

/// Extracts all share-link candidates from a text blob.
///
/// Scans every platform's URL patterns for non-overlapping, case-insensitive
/// matches and attaches password/title/size context to each.
#[must_use]
#[tracing::instrument(skip(text), fields(text_len = text.len()))]
pub fn extract(text: &str) -> Vec<LinkCandidate> {
    let size_hint = title::extract_size(text);
    let mut candidates = Vec::new();

    for entry in patterns::URL_PATTERNS.iter() {
        for pattern in &entry.patterns {
            for url_match in pattern.find_iter(text) {
                let url = url_match.as_str().to_string();
                trace!(platform = %entry.platform, url = %url, "found share URL candidate");

                let password = password::extract_password(text, url_match.start(), url_match.end());
                let title = title::extract_title(text, &url);

                candidates.push(LinkCandidate {
                    platform: entry.platform,
                    url,
                    password,
                    title,
                    size_hint: size_hint.clone(),
                });
            }
        }
    }

    debug!(candidates = candidates.len(), "extraction complete");
    candidates
}
