//! Integration tests for share-link extraction over realistic message text.

use pansaver_core::{LinkCandidate, Platform, UNKNOWN_TITLE, extract};

fn single(text: &str) -> LinkCandidate {
    let mut candidates = extract(text);
    assert_eq!(candidates.len(), 1, "expected one candidate in: {text}");
    candidates.remove(0)
}

#[test]
fn test_spec_scenario_quark_with_extraction_code() {
    let candidate = single("quark netdisk https://pan.quark.cn/s/abcd12 extraction code: a1b2");
    assert_eq!(candidate.platform, Platform::Quark);
    assert_eq!(candidate.url, "https://pan.quark.cn/s/abcd12");
    assert_eq!(candidate.password.as_deref(), Some("a1b2"));
}

#[test]
fn test_every_platform_has_a_working_pattern() {
    let samples = [
        (Platform::Quark, "https://pan.quark.cn/s/a1b2c3"),
        (Platform::Quark, "https://drive.uc.cn/s/a1b2c3"),
        (Platform::Baidu, "https://pan.baidu.com/s/1a-b_c"),
        (Platform::Baidu, "https://yun.baidu.com/s/1abc"),
        (Platform::Aliyun, "https://www.aliyundrive.com/s/a1b2c3"),
        (Platform::Aliyun, "https://www.alipan.com/s/a1b2c3"),
        (Platform::Tianyi, "https://cloud.189.cn/t/Zruai2MFJneq"),
        (Platform::Tianyi, "https://cloud.189.cn/web/share?code=abc123"),
        (Platform::Pan123, "https://www.123pan.com/s/a1b2-c3"),
    ];

    for (platform, url) in samples {
        let text = format!("新资源分享看看 {url} 大家快存");
        let candidates = extract(&text);
        assert!(
            candidates
                .iter()
                .any(|c| c.platform == platform && c.url == url),
            "no {platform} candidate with exact url {url}"
        );
    }
}

#[test]
fn test_matched_url_is_exact_substring_of_input() {
    let text = "资源 https://pan.quark.cn/s/XyZ123 提取码: ab12 完";
    for candidate in extract(text) {
        assert!(text.contains(&candidate.url));
    }
}

#[test]
fn test_realistic_chat_message_full_fields() {
    let text = "【阿凡达：水之道】4K REMUX 58.5GB\n\
                链接: https://pan.baidu.com/s/1qwErty 提取码: m4k9\n\
                失效请留言";
    let candidate = single(text);
    assert_eq!(candidate.platform, Platform::Baidu);
    assert_eq!(candidate.password.as_deref(), Some("m4k9"));
    // The title comes from the URL's own line with the link stripped out
    assert_eq!(candidate.title, "链接:  提取码: m4k9");
    assert_eq!(candidate.size_hint.as_deref(), Some("58.5GB"));
}

#[test]
fn test_title_comes_from_url_line() {
    let text = "这是一条很长的与资源无关的说明文字\n权力的游戏 全八季 https://pan.quark.cn/s/abc123";
    let candidate = single(text);
    assert_eq!(candidate.title, "权力的游戏 全八季");
}

#[test]
fn test_title_falls_back_to_unknown_for_bare_link() {
    let candidate = single("https://pan.quark.cn/s/abc123");
    assert_eq!(candidate.title, UNKNOWN_TITLE);
}

#[test]
fn test_labeled_password_wins_inside_window() {
    let text = "资源合集 https://pan.quark.cn/s/abc123\n提取码: zz99";
    let candidate = single(text);
    assert_eq!(candidate.password.as_deref(), Some("zz99"));
}

#[test]
fn test_cjk_heavy_text_never_panics() {
    // Window boundaries landing inside multibyte characters must be clamped
    let heavy = "电影电视剧资源大全每日更新".repeat(30);
    let text = format!("{heavy}https://pan.quark.cn/s/abc123{heavy}");
    let candidates = extract(&text);
    assert_eq!(candidates.len(), 1);
}

#[test]
fn test_multiple_links_multiple_candidates_in_order() {
    let text = "https://pan.quark.cn/s/first 和 https://pan.quark.cn/s/second";
    let candidates = extract(text);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].url, "https://pan.quark.cn/s/first");
    assert_eq!(candidates[1].url, "https://pan.quark.cn/s/second");
}

#[test]
fn test_plain_text_without_links_yields_nothing() {
    assert!(extract("今天天气不错，没有资源").is_empty());
    assert!(extract("see example.com/s/abc for details").is_empty());
}
