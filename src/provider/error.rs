//! Error types for provider adapter operations.

use thiserror::Error;

use crate::auth::SessionError;

/// Errors reported by provider adapters.
///
/// Every variant fails only the link being transferred; the transfer engine
/// records it and moves on to the next item.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The share passcode was missing or rejected, or the account session
    /// behind the adapter is unusable.
    #[error("share authorization failed: {message}")]
    Auth {
        /// Provider-reported reason.
        message: String,
    },

    /// The provider signalled throttling (HTTP 429).
    #[error("provider throttled the request")]
    Throttled,

    /// A remote call failed at the transport layer.
    #[error("network error: {0}")]
    Network(String),

    /// A remote call exceeded its time bound.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// The bound that was exceeded.
        seconds: u64,
    },

    /// The provider answered with a non-success envelope or HTTP status.
    #[error("provider call failed (status {status}): {message}")]
    Protocol {
        /// Envelope or HTTP status code.
        status: i64,
        /// Provider-reported message.
        message: String,
    },

    /// An expected page control did not appear within its wait bound.
    #[error("page control missing: {step} (waited {waited_secs}s)")]
    AutomationStep {
        /// Which step was being attempted.
        step: String,
        /// How long the step waited.
        waited_secs: u64,
    },

    /// The share resolved but lists no files.
    #[error("share contains no files")]
    EmptyShare,

    /// The share URL does not carry a recognizable share id.
    #[error("invalid share url {url}: {reason}")]
    InvalidShareUrl {
        /// The offending URL.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The cached browser session is missing or expired.
    #[error("browser session unavailable: {0}")]
    Session(#[from] SessionError),

    /// The provider HTTP client could not be constructed.
    #[error("failed to build provider HTTP client: {0}")]
    ClientBuild(String),
}

impl ProviderError {
    /// Maps a transport error, distinguishing timeouts from other failures.
    pub(crate) fn from_reqwest(err: &reqwest::Error, bound_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                seconds: bound_secs,
            }
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Returns true when the failure is an authorization problem.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Session(_))
    }
}
