//! Access-password extraction around a matched share URL.
//!
//! Share messages usually carry the extraction code near the link
//! ("提取码: ab12", "password: ab12"), so the search is confined to a
//! bounded character window around the URL match. Labeled patterns are
//! tried first; a bare 4-8 alphanumeric run is the last resort and is
//! knowingly permissive.

use std::sync::LazyLock;

use regex::Regex;

/// Characters of context searched on each side of the URL match.
const PASSWORD_WINDOW: usize = 200;

/// Accepted password length range.
const MIN_PASSWORD_LEN: usize = 4;
const MAX_PASSWORD_LEN: usize = 8;

/// Password patterns in priority order; the first match wins.
#[allow(clippy::expect_used)]
static PASSWORD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Chinese labels used by share messages on every supported platform
        r"(?:密码|提取码|提取密码|访问码)[:：\s]*([a-zA-Z0-9]{4,8})",
        // English labels
        r"(?i)(?:extraction code|access code|passcode|password|pwd)[:：\s]*([a-zA-Z0-9]{4,8})",
        // Bare 4-8 alphanumeric run, last resort
        r"([a-zA-Z0-9]{4,8})",
    ]
    .iter()
    .map(|re| Regex::new(re).expect("password regex is valid")) // Static pattern, safe to panic
    .collect()
});

/// Searches the window around `url_start..url_end` for an access password.
///
/// Returns the first labeled match, falling back to a bare alphanumeric
/// run; the capture must be 4-8 alphanumeric characters.
pub(crate) fn extract_password(text: &str, url_start: usize, url_end: usize) -> Option<String> {
    let start = window_start(text, url_start);
    let end = window_end(text, url_end);
    let window = &text[start..end];

    for pattern in PASSWORD_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(window) {
            let candidate = captures.get(1).map(|m| m.as_str())?;
            if is_valid_password(candidate) {
                return Some(candidate.to_string());
            }
        }
    }

    None
}

fn is_valid_password(candidate: &str) -> bool {
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&candidate.len())
        && candidate.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Byte index [`PASSWORD_WINDOW`] characters before `url_start`. Share text
/// is routinely CJK, so the window is counted in characters and always
/// lands on a char boundary.
fn window_start(text: &str, url_start: usize) -> usize {
    text[..url_start]
        .char_indices()
        .rev()
        .nth(PASSWORD_WINDOW - 1)
        .map_or(0, |(i, _)| i)
}

/// Byte index [`PASSWORD_WINDOW`] characters after `url_end`.
fn window_end(text: &str, url_end: usize) -> usize {
    text[url_end..]
        .char_indices()
        .nth(PASSWORD_WINDOW)
        .map_or(text.len(), |(i, _)| url_end + i)
}
