//! Output types of the page fetcher. Consumed once per enrichment run,
//! never persisted.

use serde::{Deserialize, Serialize};

/// An image URL discovered on a page, with dimensions when the page
/// declared or rendered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CandidateImage {
    /// Pixel area, used as a proxy for "most likely a genuine product photo".
    #[must_use]
    pub fn area(&self) -> Option<u64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(u64::from(w) * u64::from(h)),
            _ => None,
        }
    }
}

/// A titled content section extracted from the page body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// The fetcher's result: normalized content HTML, page title, and candidate
/// images sorted by descending pixel area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub html: String,
    pub title: String,
    pub images: Vec<CandidateImage>,
    pub sections: Vec<Section>,
}

impl ScrapedPage {
    /// Image URLs in candidate order, for callers that only need the list.
    #[must_use]
    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|i| i.url.clone()).collect()
    }
}
