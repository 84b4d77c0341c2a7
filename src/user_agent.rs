//! Shared User-Agent string for provider HTTP and automation traffic.
//!
//! The netdisk share APIs reject non-browser clients, so all provider calls
//! present the same desktop-browser identity. Single source so the token
//! adapter and any future provider stay consistent.

/// Browser identity presented to provider APIs.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/94.0.4606.71 Safari/537.36";

/// Returns the User-Agent sent on every provider call.
#[must_use]
pub(crate) fn provider_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}
