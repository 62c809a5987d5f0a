//! Locator normalization.
//!
//! Content records often store whatever the editor pasted: a bare id, a
//! watch-page URL, an embed URL. Embed-based providers only accept the bare
//! id, so full URLs are reduced here, before a [`ContentSource`] exists.
//!
//! [`ContentSource`]: super::ContentSource

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::Provider;
use crate::{Error, Result};

/// `/embed/<library>/<video>` and `/play/<library>/<video>`.
static LIBRARY_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:embed|play)/(\d+)/([^/?#]+)").unwrap());

/// Characters allowed in a bare embed id.
static BARE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-./:=]+$").unwrap());

const CDN_A_MARKERS: &[&str] = &["embed", "e", "watch", "video", "videos", "shorts", "live"];
const REGION_CDN_MARKERS: &[&str] = &["embed", "v"];
const SOCIAL_MARKERS: &[&str] = &["p", "reel", "reels", "tv", "v"];

/// Reduce `raw` to the locator format `provider` expects.
pub(crate) fn normalize_locator(provider: Provider, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_locator(provider, "locator is empty"));
    }

    let Some(url) = parse_http_url(trimmed) else {
        return normalize_bare(provider, trimmed);
    };

    let id = match provider {
        Provider::DirectFile => {
            let mut url = url;
            url.set_fragment(None);
            return Ok(url.to_string());
        }
        Provider::EmbeddedCdnA => query_param(&url, "v")
            .or_else(|| segment_after(&url, CDN_A_MARKERS))
            .or_else(|| last_segment(&url)),
        Provider::EmbeddedCdnB => library_pair(&url).or_else(|| last_segment(&url)),
        Provider::RegionCdn => segment_after(&url, REGION_CDN_MARKERS).or_else(|| last_segment(&url)),
        Provider::SocialEmbed => segment_after(&url, SOCIAL_MARKERS).or_else(|| last_segment(&url)),
    };

    id.map(|id| strip_page_extension(&id).to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::invalid_locator(provider, format!("no video id in `{trimmed}`")))
}

fn normalize_bare(provider: Provider, locator: &str) -> Result<String> {
    if provider == Provider::DirectFile {
        // Relative storage keys are resolved by the rendering layer.
        return Ok(locator.to_string());
    }

    let id = locator.trim_matches('/');
    if id.is_empty() || !BARE_ID_REGEX.is_match(id) {
        return Err(Error::invalid_locator(
            provider,
            format!("`{locator}` is neither a URL nor a video id"),
        ));
    }
    Ok(strip_page_extension(id).to_string())
}

fn parse_http_url(input: &str) -> Option<Url> {
    let url = Url::parse(input).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

fn segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// The segment following the first marker whose successor is not itself a marker,
/// so `/videos/embed/<id>` resolves to `<id>` rather than `embed`.
fn segment_after(url: &Url, markers: &[&str]) -> Option<String> {
    let segments = segments(url);
    segments
        .windows(2)
        .find(|pair| markers.contains(&pair[0]) && !markers.contains(&pair[1]))
        .map(|pair| pair[1].to_string())
}

fn last_segment(url: &Url) -> Option<String> {
    segments(url).last().map(|s| s.to_string())
}

fn library_pair(url: &Url) -> Option<String> {
    LIBRARY_PATH_REGEX
        .captures(url.path())
        .map(|caps| format!("{}/{}", &caps[1], &caps[2]))
}

fn strip_page_extension(id: &str) -> &str {
    id.strip_suffix(".html")
        .or_else(|| id.strip_suffix(".htm"))
        .unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(provider: Provider, raw: &str) -> String {
        normalize_locator(provider, raw).unwrap()
    }

    #[test]
    fn test_bare_ids_pass_through() {
        assert_eq!(normalize(Provider::EmbeddedCdnA, "  v1 "), "v1");
        assert_eq!(normalize(Provider::RegionCdn, "r1/"), "r1");
        assert_eq!(normalize(Provider::EmbeddedCdnB, "1234/abcd-ef"), "1234/abcd-ef");
    }

    #[test]
    fn test_cdn_a_watch_and_embed_urls() {
        assert_eq!(
            normalize(Provider::EmbeddedCdnA, "https://www.cdn-a.example/watch?v=dQw4w9WgXcQ&t=10"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            normalize(Provider::EmbeddedCdnA, "https://cdn-a.example/embed/dQw4w9WgXcQ?autoplay=1"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            normalize(Provider::EmbeddedCdnA, "https://player.cdn-a.example/video/76979871"),
            "76979871"
        );
        assert_eq!(normalize(Provider::EmbeddedCdnA, "https://a.example/xyz789/"), "xyz789");
    }

    #[test]
    fn test_cdn_b_keeps_library_and_video() {
        assert_eq!(
            normalize(
                Provider::EmbeddedCdnB,
                "https://iframe.cdn-b.example/embed/4821/6a1f-22bc?autoplay=true"
            ),
            "4821/6a1f-22bc"
        );
        assert_eq!(
            normalize(Provider::EmbeddedCdnB, "https://cdn-b.example/files/6a1f-22bc"),
            "6a1f-22bc"
        );
    }

    #[test]
    fn test_region_cdn_embed_urls() {
        assert_eq!(
            normalize(Provider::RegionCdn, "https://region.example/videos/embed/r1"),
            "r1"
        );
        assert_eq!(normalize(Provider::RegionCdn, "https://region.example/v/Ab12.html"), "Ab12");
    }

    #[test]
    fn test_social_embed_post_urls() {
        assert_eq!(
            normalize(Provider::SocialEmbed, "https://social.example/reel/CxYz123/?igsh=1"),
            "CxYz123"
        );
        assert_eq!(normalize(Provider::SocialEmbed, "https://social.example/p/Q9/embed"), "Q9");
    }

    #[test]
    fn test_direct_file_keeps_full_url() {
        assert_eq!(
            normalize(Provider::DirectFile, "https://storage.example/course/1.mp4?sig=abc#t=5"),
            "https://storage.example/course/1.mp4?sig=abc"
        );
        assert_eq!(normalize(Provider::DirectFile, "uploads/course 1.mp4"), "uploads/course 1.mp4");
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(normalize_locator(Provider::RegionCdn, "   ").is_err());
        assert!(normalize_locator(Provider::EmbeddedCdnA, "not an id").is_err());
        assert!(normalize_locator(Provider::SocialEmbed, "https://social.example/").is_err());
    }
}
