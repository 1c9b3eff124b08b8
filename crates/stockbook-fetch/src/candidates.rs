//! Candidate-image filtering shared by both fetch paths.
//!
//! A URL survives into the candidate list only if it clears the exclusion
//! keywords, the minimum-edge threshold (when dimensions are known), and
//! query-stripped deduplication. Survivors are sorted by descending pixel
//! area and capped.

use std::collections::HashSet;

use url::Url;

use crate::types::CandidateImage;
use stockbook_core::{MAX_IMAGE_CANDIDATES, MIN_CANDIDATE_EDGE};

/// Substrings that disqualify a URL or alt text on the static path.
pub const BASE_EXCLUDE_KEYWORDS: &[&str] = &["icon", "logo", "sprite", "badge"];

/// Expanded list for the headless path, where chrome and navigation assets
/// are rendered into the DOM.
pub const HEADLESS_EXCLUDE_KEYWORDS: &[&str] = &[
    "icon",
    "logo",
    "sprite",
    "badge",
    "banner",
    "thumbnail",
    "thumb",
    "arrow",
    "menu",
    "cart",
    "social",
    "payment",
    "shipping",
    "favicon",
    "placeholder",
    "avatar",
];

/// Case-insensitive keyword match against the URL and alt text.
#[must_use]
pub fn is_excluded(url: &str, alt: &str, keywords: &[&str]) -> bool {
    let url_lower = url.to_ascii_lowercase();
    let alt_lower = alt.to_ascii_lowercase();
    keywords
        .iter()
        .any(|k| url_lower.contains(k) || alt_lower.contains(k))
}

/// A candidate with unknown dimensions passes (checked again at decode
/// time); otherwise the longer edge must reach [`MIN_CANDIDATE_EDGE`].
#[must_use]
pub fn passes_edge_threshold(width: Option<u32>, height: Option<u32>) -> bool {
    match (width, height) {
        (None, None) => true,
        (w, h) => w.max(h).unwrap_or(0) >= MIN_CANDIDATE_EDGE,
    }
}

/// Deduplication key: the URL without its query string. CDN variants of the
/// same asset differ only in query parameters.
#[must_use]
pub fn dedupe_key(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Picks the first URL out of a `srcset`-style attribute value.
#[must_use]
pub fn first_srcset_candidate(srcset: &str) -> Option<String> {
    let first = srcset.split(',').next()?;
    let url = first.split_whitespace().next()?;
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// Resolves a possibly-relative image URL against the page URL. Returns
/// `None` for empty input or values that cannot form an absolute http(s) URL.
#[must_use]
pub fn resolve_image_url(page_url: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    let resolved = page_url.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Accumulates candidates with query-stripped dedup.
#[derive(Debug, Default)]
pub struct CandidateSet {
    seen: HashSet<String>,
    images: Vec<CandidateImage>,
}

impl CandidateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate unless an entry with the same query-stripped URL is
    /// already present.
    pub fn push(&mut self, candidate: CandidateImage) {
        let key = dedupe_key(&candidate.url).to_string();
        if self.seen.insert(key) {
            self.images.push(candidate);
        }
    }

    /// Sorts by descending pixel area (unknown areas last, in discovery
    /// order) and caps at [`MAX_IMAGE_CANDIDATES`].
    #[must_use]
    pub fn finalize(self) -> Vec<CandidateImage> {
        let mut images = self.images;
        images.sort_by(|a, b| b.area().unwrap_or(0).cmp(&a.area().unwrap_or(0)));
        images.truncate(MAX_IMAGE_CANDIDATES);
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, width: Option<u32>, height: Option<u32>) -> CandidateImage {
        CandidateImage {
            url: url.to_string(),
            width,
            height,
        }
    }

    #[test]
    fn exclusion_is_case_insensitive() {
        assert!(is_excluded(
            "https://cdn.example.com/ICON-cart.png",
            "",
            BASE_EXCLUDE_KEYWORDS
        ));
        assert!(is_excluded(
            "https://cdn.example.com/photo.png",
            "Brand Logo",
            BASE_EXCLUDE_KEYWORDS
        ));
        assert!(!is_excluded(
            "https://cdn.example.com/product-front.png",
            "front view",
            BASE_EXCLUDE_KEYWORDS
        ));
    }

    #[test]
    fn no_excluded_keyword_survives_filtering() {
        let urls = [
            "https://a.example/images/icon.png",
            "https://a.example/images/logo.jpg",
            "https://a.example/assets/sprite.svg",
            "https://a.example/assets/trust-badge.png",
        ];
        for url in urls {
            assert!(
                is_excluded(url, "", BASE_EXCLUDE_KEYWORDS),
                "{url} should be excluded"
            );
        }
    }

    #[test]
    fn edge_threshold_unknown_dimensions_pass() {
        assert!(passes_edge_threshold(None, None));
    }

    #[test]
    fn edge_threshold_rejects_small_known_dimensions() {
        assert!(!passes_edge_threshold(Some(399), Some(200)));
        assert!(!passes_edge_threshold(Some(64), None));
        assert!(passes_edge_threshold(Some(400), Some(120)));
        assert!(passes_edge_threshold(None, Some(1080)));
    }

    #[test]
    fn dedupe_key_strips_query() {
        assert_eq!(
            dedupe_key("https://cdn.example.com/a.jpg?w=1200&fmt=webp"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            dedupe_key("https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn candidate_set_dedupes_cdn_variants() {
        let mut set = CandidateSet::new();
        set.push(candidate("https://c.example/a.jpg?w=600", Some(600), Some(600)));
        set.push(candidate("https://c.example/a.jpg?w=1200", Some(1200), Some(1200)));
        set.push(candidate("https://c.example/b.jpg", Some(800), Some(800)));
        let images = set.finalize();
        assert_eq!(images.len(), 2);
        // Sorted by area, so b.jpg (800x800) leads; the first-seen a.jpg
        // variant is the one kept.
        assert_eq!(images[0].url, "https://c.example/b.jpg");
        assert_eq!(images[1].url, "https://c.example/a.jpg?w=600");
    }

    #[test]
    fn finalize_sorts_by_area_and_caps() {
        let mut set = CandidateSet::new();
        for i in 0..40u32 {
            set.push(candidate(
                &format!("https://c.example/{i}.jpg"),
                Some(400 + i),
                Some(400 + i),
            ));
        }
        let images = set.finalize();
        assert_eq!(images.len(), stockbook_core::MAX_IMAGE_CANDIDATES);
        assert_eq!(images[0].url, "https://c.example/39.jpg");
    }

    #[test]
    fn srcset_first_candidate() {
        assert_eq!(
            first_srcset_candidate("https://c.example/a-320.jpg 320w, https://c.example/a-640.jpg 640w"),
            Some("https://c.example/a-320.jpg".to_string())
        );
        assert_eq!(first_srcset_candidate(""), None);
    }

    #[test]
    fn resolve_relative_against_origin() {
        let page = Url::parse("https://shop.example.com/products/sub-mini").unwrap();
        assert_eq!(
            resolve_image_url(&page, "/media/a.jpg").as_deref(),
            Some("https://shop.example.com/media/a.jpg")
        );
        assert_eq!(resolve_image_url(&page, "data:image/gif;base64,xyz"), None);
        assert_eq!(resolve_image_url(&page, ""), None);
    }
}
