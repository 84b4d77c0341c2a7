//! Per-platform share-URL patterns.
//!
//! Each platform keeps an ordered list of patterns because most providers
//! expose their shares under more than one host (e.g. Quark shares appear
//! under both `pan.quark.cn` and `drive.uc.cn`). The same true link may be
//! captured by more than one variant; the repository deduplicates at insert.

use std::sync::LazyLock;

use regex::Regex;

use super::Platform;

/// URL patterns for one platform, in match priority order.
pub(crate) struct PlatformPatterns {
    pub platform: Platform,
    pub patterns: Vec<Regex>,
}

#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("share URL regex is valid") // Static pattern, safe to panic
}

/// Share-URL pattern table, scanned in [`Platform::ALL`] order.
pub(crate) static URL_PATTERNS: LazyLock<Vec<PlatformPatterns>> = LazyLock::new(|| {
    vec![
        PlatformPatterns {
            platform: Platform::Quark,
            patterns: vec![
                pattern(r"(?i)https?://pan\.quark\.cn/s/[a-zA-Z0-9]+"),
                pattern(r"(?i)https?://drive\.uc\.cn/s/[a-zA-Z0-9]+"),
            ],
        },
        PlatformPatterns {
            platform: Platform::Baidu,
            patterns: vec![
                pattern(r"(?i)https?://pan\.baidu\.com/s/[a-zA-Z0-9_-]+"),
                pattern(r"(?i)https?://yun\.baidu\.com/s/[a-zA-Z0-9_-]+"),
            ],
        },
        PlatformPatterns {
            platform: Platform::Aliyun,
            patterns: vec![
                pattern(r"(?i)https?://www\.aliyundrive\.com/s/[a-zA-Z0-9]+"),
                pattern(r"(?i)https?://www\.alipan\.com/s/[a-zA-Z0-9]+"),
            ],
        },
        PlatformPatterns {
            platform: Platform::Tianyi,
            patterns: vec![
                pattern(r"(?i)https?://cloud\.189\.cn/t/[a-zA-Z0-9]+"),
                pattern(r"(?i)https?://cloud\.189\.cn/web/share\?[a-zA-Z0-9&=]+"),
            ],
        },
        PlatformPatterns {
            platform: Platform::Pan123,
            patterns: vec![pattern(r"(?i)https?://www\.123pan\.com/s/[a-zA-Z0-9_-]+")],
        },
    ]
});
