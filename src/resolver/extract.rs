//! HTML heuristics for locating a media address.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// File extensions recognised as direct media.
pub const MEDIA_EXTENSIONS: &[&str] = &[".mp4", ".m3u8", ".webm", ".mkv", ".mov"];

/// Attributes that may carry an address, in order of preference.
const ADDRESS_ATTRIBUTES: &[&str] = &["href", "src", "content"];

static VIDEO_SELECTOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("video").ok());
static SOURCE_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("source").ok());
static CANDIDATE_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("a, source, meta, script").ok());

/// Finds a media address in page markup.
///
/// Rules, first hit wins:
/// 1. the first `<video>` element's nested `<source src>`, then its own `src`;
/// 2. any `a`, `source`, `meta` or `script` element whose address attribute
///    looks like media.
#[must_use]
pub fn extract_media_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(src) = video_element_source(&document) {
        return Some(src);
    }

    document
        .select(CANDIDATE_SELECTOR.as_ref()?)
        .filter_map(address_attribute)
        .find(|value| looks_like_media(value))
        .map(str::to_owned)
}

fn video_element_source(document: &Html) -> Option<String> {
    let video = document.select(VIDEO_SELECTOR.as_ref()?).next()?;

    video
        .select(SOURCE_SELECTOR.as_ref()?)
        .filter_map(|source| non_empty_attr(source, "src"))
        .next()
        .or_else(|| non_empty_attr(video, "src"))
        .map(str::to_owned)
}

fn non_empty_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}

fn address_attribute(element: ElementRef<'_>) -> Option<&str> {
    ADDRESS_ATTRIBUTES
        .iter()
        .find_map(|name| non_empty_attr(element, name))
}

fn looks_like_media(value: &str) -> bool {
    MEDIA_EXTENSIONS
        .iter()
        .any(|ext| value.ends_with(ext) || value.contains(&format!("{ext}?")))
        || value.contains("cdn")
        || value.contains("video")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_compile() {
        assert!(VIDEO_SELECTOR.is_some());
        assert!(SOURCE_SELECTOR.is_some());
        assert!(CANDIDATE_SELECTOR.is_some());
    }

    #[test]
    fn test_repeated_extraction_reuses_selectors() {
        let html = r#"<a href="https://example.com/a.mp4">a</a>"#;
        for _ in 0..3 {
            assert_eq!(
                extract_media_url(html).as_deref(),
                Some("https://example.com/a.mp4")
            );
        }
    }

    #[test]
    fn test_nested_source_wins() {
        let html = r#"
            <html><body>
              <a href="https://cdn.example.com/other.mp4">other</a>
              <video src="https://example.com/own.mp4">
                <source src="https://example.com/nested.mp4" type="video/mp4">
              </video>
            </body></html>"#;
        assert_eq!(
            extract_media_url(html).as_deref(),
            Some("https://example.com/nested.mp4")
        );
    }

    #[test]
    fn test_video_own_src_when_no_source() {
        let html = r#"<video controls src="https://example.com/own.webm"></video>"#;
        assert_eq!(
            extract_media_url(html).as_deref(),
            Some("https://example.com/own.webm")
        );
    }

    #[test]
    fn test_empty_source_falls_back_to_video_src() {
        let html = r#"<video src="https://example.com/own.mp4"><source src=""></video>"#;
        assert_eq!(
            extract_media_url(html).as_deref(),
            Some("https://example.com/own.mp4")
        );
    }

    #[test]
    fn test_meta_content_scan() {
        let html = r#"
            <head>
              <meta property="og:title" content="Some clip">
              <meta property="og:video" content="https://files.example.com/clip.mp4?token=abc">
            </head>"#;
        assert_eq!(
            extract_media_url(html).as_deref(),
            Some("https://files.example.com/clip.mp4?token=abc")
        );
    }

    #[test]
    fn test_scan_uses_document_order() {
        let html = r#"
            <a href="/about">About</a>
            <a href="https://cdn.example.net/a">first</a>
            <script src="https://example.com/player/video.js"></script>"#;
        assert_eq!(
            extract_media_url(html).as_deref(),
            Some("https://cdn.example.net/a")
        );
    }

    #[test]
    fn test_videoless_player_falls_through_to_scan() {
        let html = r#"
            <video id="player"></video>
            <a href="https://example.com/stream/index.m3u8">stream</a>"#;
        assert_eq!(
            extract_media_url(html).as_deref(),
            Some("https://example.com/stream/index.m3u8")
        );
    }

    #[test]
    fn test_href_preferred_over_src() {
        let html = r#"<a href="https://example.com/page" src="https://example.com/x.mp4">x</a>"#;
        assert_eq!(extract_media_url(html), None);
    }

    #[test]
    fn test_no_match() {
        let html = r#"<html><body><a href="/login">Login</a><img src="/logo.png"></body></html>"#;
        assert_eq!(extract_media_url(html), None);
        assert_eq!(extract_media_url(""), None);
    }

    #[test]
    fn test_looks_like_media() {
        assert!(looks_like_media("https://x.test/a.mp4"));
        assert!(looks_like_media("https://x.test/a.mkv?dl=1"));
        assert!(looks_like_media("https://mycdn.test/a"));
        assert!(!looks_like_media("https://x.test/a.mp4.html"));
        assert!(!looks_like_media("https://x.test/page"));
    }
}
