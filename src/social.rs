//! Embeddable URLs for social-video media items.

use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    YouTube,
    Vimeo,
    Instagram,
    TikTok,
    Facebook,
}

struct Patterns {
    youtube: Regex,
    vimeo: Regex,
    instagram: Regex,
    tiktok: Regex,
    facebook: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        youtube: Regex::new(
            r"^https?://(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
        )
        .expect("YouTube pattern is valid"),
        vimeo: Regex::new(r"^https?://(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)")
            .expect("Vimeo pattern is valid"),
        instagram: Regex::new(r"^https?://(?:www\.)?instagram\.com/(?:p|reel|tv)/([A-Za-z0-9_-]+)")
            .expect("Instagram pattern is valid"),
        tiktok: Regex::new(r"^https?://(?:www\.)?tiktok\.com/@[^/]+/video/(\d+)")
            .expect("TikTok pattern is valid"),
        facebook: Regex::new(r"^https?://(?:www\.|m\.)?(?:facebook\.com|fb\.watch)/")
            .expect("Facebook pattern is valid"),
    })
}

/// Detect the platform hosting a social video.
pub fn detect_platform(url: &str) -> Option<SocialPlatform> {
    let p = patterns();
    let url = url.trim();

    if p.youtube.is_match(url) {
        Some(SocialPlatform::YouTube)
    } else if p.vimeo.is_match(url) {
        Some(SocialPlatform::Vimeo)
    } else if p.instagram.is_match(url) {
        Some(SocialPlatform::Instagram)
    } else if p.tiktok.is_match(url) {
        Some(SocialPlatform::TikTok)
    } else if p.facebook.is_match(url) {
        Some(SocialPlatform::Facebook)
    } else {
        None
    }
}

/// Embeddable player URL for a social video link. Unknown links are
/// returned unchanged.
pub fn embed_url(url: &str) -> String {
    let p = patterns();
    let url = url.trim();

    let capture = |re: &Regex| {
        re.captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    match detect_platform(url) {
        Some(SocialPlatform::YouTube) => capture(&p.youtube)
            .map(|id| format!("https://www.youtube.com/embed/{}", id)),
        Some(SocialPlatform::Vimeo) => {
            capture(&p.vimeo).map(|id| format!("https://player.vimeo.com/video/{}", id))
        }
        Some(SocialPlatform::Instagram) => {
            capture(&p.instagram).map(|id| format!("https://www.instagram.com/p/{}/embed", id))
        }
        Some(SocialPlatform::TikTok) => {
            capture(&p.tiktok).map(|id| format!("https://www.tiktok.com/embed/v2/{}", id))
        }
        Some(SocialPlatform::Facebook) => {
            Url::parse_with_params("https://www.facebook.com/plugins/video.php", &[("href", url)])
                .ok()
                .map(String::from)
        }
        None => None,
    }
    .unwrap_or_else(|| url.to_string())
}
