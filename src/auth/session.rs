//! Cached authenticated browser session.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A single cookie from the cached session file.
///
/// The value field is redacted in Debug output to prevent accidental
/// logging of credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive — never log).
    value: String,
    /// Domain the cookie belongs to (e.g. `.quark.cn`).
    pub domain: String,
    /// URL path scope.
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix expiry in seconds; absent or negative means a session cookie.
    #[serde(default)]
    pub expires: Option<f64>,
}

fn default_path() -> String {
    "/".to_string()
}

impl SessionCookie {
    /// Creates a new cookie entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        expires: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive — avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the expiry as unix seconds for persistent cookies.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn expires_at(&self) -> Option<i64> {
        self.expires.filter(|e| *e > 0.0).map(|e| e as i64)
    }

    /// Returns true when this cookie applies to the given host.
    #[must_use]
    pub fn matches_domain(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{domain}"))
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .finish()
    }
}

/// Errors that can occur while loading or validating a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session cache file does not exist.
    #[error("no cached session at {path}: log in with the capture tool first")]
    Missing {
        /// Expected cache path.
        path: PathBuf,
    },

    /// I/O error reading the session file.
    #[error("failed to read session file: {0}")]
    Io(#[from] std::io::Error),

    /// The session file is not valid cookie JSON.
    #[error("invalid session file: {0}")]
    Json(#[from] serde_json::Error),

    /// The session file contained no cookies.
    #[error("session file contains no cookies")]
    Empty,

    /// The cached session has expired.
    #[error("cached session expired at unix {expired_at}: log in again with the capture tool")]
    Expired {
        /// Unix seconds at which the earliest persistent cookie expired.
        expired_at: i64,
    },
}

/// A previously acquired authenticated browser session, cached as a JSON
/// cookie list on disk by the login/capture tool.
#[derive(Debug, Clone)]
pub struct BrowserSession {
    cookies: Vec<SessionCookie>,
    path: PathBuf,
}

impl BrowserSession {
    /// Loads the cached session from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Missing`] when the file does not exist,
    /// [`SessionError::Io`]/[`SessionError::Json`] on unreadable content,
    /// and [`SessionError::Empty`] when the file holds no cookies.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        if !path.exists() {
            return Err(SessionError::Missing {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path)?;
        let cookies: Vec<SessionCookie> = serde_json::from_str(&raw)?;
        if cookies.is_empty() {
            return Err(SessionError::Empty);
        }

        debug!(cookies = cookies.len(), "loaded cached session");
        Ok(Self {
            cookies,
            path: path.to_path_buf(),
        })
    }

    /// Builds a session directly from cookies (tests, embedding callers).
    #[must_use]
    pub fn from_cookies(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies,
            path: PathBuf::new(),
        }
    }

    /// Returns the cached cookie list.
    #[must_use]
    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    /// Returns the path the session was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unix time at which the session stops being usable: the earliest
    /// expiry among persistent cookies. Session-only cookies carry no
    /// expiry and do not participate.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.cookies.iter().filter_map(SessionCookie::expires_at).min()
    }

    /// Returns true when the session has expired as of `now` (unix seconds).
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|t| t <= now)
    }

    /// Fails with [`SessionError::Expired`] when the session is no longer
    /// fresh. Adapters call this before every use so expiry surfaces as an
    /// auth failure instead of an opaque mid-automation timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expired`] when past the earliest expiry.
    pub fn require_fresh(&self, now: i64) -> Result<(), SessionError> {
        match self.expires_at() {
            Some(expired_at) if expired_at <= now => Err(SessionError::Expired { expired_at }),
            _ => Ok(()),
        }
    }

    /// Renders a `Cookie` header value for cookies matching the host.
    #[must_use]
    pub fn cookie_header(&self, host: &str) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| c.matches_domain(host))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}
