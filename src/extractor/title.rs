//! Title and size-hint extraction for a matched share URL.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel title used when no line qualifies.
pub const UNKNOWN_TITLE: &str = "unknown";

/// Accepted title length range, in characters (lower inclusive).
const MIN_TITLE_LEN: usize = 5;
const MAX_TITLE_LEN: usize = 100;

/// Stored titles are capped to this many characters.
const TITLE_CAP: usize = 50;

#[allow(clippy::expect_used)]
static MARKUP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup regex is valid")); // Static pattern, safe to panic

#[allow(clippy::expect_used)]
static EMBEDDED_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex is valid")); // Static pattern, safe to panic

#[allow(clippy::expect_used)]
static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?\s*[KMGT]B)").expect("size regex is valid")); // Static pattern, safe to panic

/// Derives a title from the line containing the URL match.
///
/// Markup tags and embedded URLs are stripped from that line; the result is
/// accepted when its trimmed length is within `[5, 100)` characters and
/// capped at 50. Anything else falls back to [`UNKNOWN_TITLE`].
pub(crate) fn extract_title(text: &str, url: &str) -> String {
    for line in text.lines() {
        if !line.contains(url) {
            continue;
        }
        let cleaned = MARKUP_PATTERN.replace_all(line, "");
        let cleaned = EMBEDDED_URL_PATTERN.replace_all(&cleaned, "");
        let cleaned = cleaned.trim();

        let char_count = cleaned.chars().count();
        if (MIN_TITLE_LEN..MAX_TITLE_LEN).contains(&char_count) {
            return cleaned.chars().take(TITLE_CAP).collect();
        }
    }

    UNKNOWN_TITLE.to_string()
}

/// Finds a declared file size near the share text (e.g. "2.5GB").
pub(crate) fn extract_size(text: &str) -> Option<String> {
    SIZE_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_url_line() {
        let text = "权力的游戏 全八季 1080P https://pan.quark.cn/s/abcd12";
        assert_eq!(
            extract_title(text, "https://pan.quark.cn/s/abcd12"),
            "权力的游戏 全八季 1080P"
        );
    }

    #[test]
    fn test_title_strips_markup_and_urls() {
        let text = "<b>Planet Earth II</b> https://pan.baidu.com/s/1abc complete";
        assert_eq!(
            extract_title(text, "https://pan.baidu.com/s/1abc"),
            "Planet Earth II  complete"
        );
    }

    #[test]
    fn test_title_too_short_falls_back() {
        let text = "abc https://pan.quark.cn/s/abcd12";
        assert_eq!(extract_title(text, "https://pan.quark.cn/s/abcd12"), UNKNOWN_TITLE);
    }

    #[test]
    fn test_title_too_long_falls_back() {
        let filler = "x".repeat(120);
        let text = format!("{filler} https://pan.quark.cn/s/abcd12");
        assert_eq!(extract_title(&text, "https://pan.quark.cn/s/abcd12"), UNKNOWN_TITLE);
    }

    #[test]
    fn test_title_capped_at_fifty_chars() {
        let long = "长".repeat(80);
        let text = format!("{long} https://pan.quark.cn/s/abcd12");
        let title = extract_title(&text, "https://pan.quark.cn/s/abcd12");
        assert_eq!(title.chars().count(), TITLE_CAP);
        assert!(title.chars().all(|c| c == '长'));
    }

    #[test]
    fn test_title_only_from_line_containing_url() {
        let text = "第一行是别的资源说明文字\nhttps://pan.quark.cn/s/abcd12";
        // The URL sits alone on its line; stripping the URL leaves nothing.
        assert_eq!(extract_title(text, "https://pan.quark.cn/s/abcd12"), UNKNOWN_TITLE);
    }

    #[test]
    fn test_extract_size_bare() {
        assert_eq!(extract_size("全集打包 2.5GB 高清"), Some("2.5GB".into()));
    }

    #[test]
    fn test_extract_size_labeled_and_spaced() {
        assert_eq!(extract_size("大小: 700 MB"), Some("700 MB".into()));
    }

    #[test]
    fn test_extract_size_absent() {
        assert_eq!(extract_size("没有大小说明"), None);
    }
}
