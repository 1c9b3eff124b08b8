//! Shared domain types for the enrichment pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which half (or both) of the enrichment pipeline a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentMode {
    /// Metadata fields only; the image pipeline is not touched.
    Metas,
    /// Images only: URL resolution → scrape → download → classify → feature.
    Images,
    /// Metadata first, then the full images path.
    All,
}

impl std::fmt::Display for EnrichmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentMode::Metas => write!(f, "metas"),
            EnrichmentMode::Images => write!(f, "images"),
            EnrichmentMode::All => write!(f, "all"),
        }
    }
}

/// Gallery filter requested by the caller for classification runs.
///
/// A constrained filter makes the classifier maximally strict: everything
/// outside the requested category is reclassified as `unwanted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    All,
    Product,
    Lifestyle,
}

/// Category assigned to a stored image by the classifier.
///
/// `Unwanted` excludes an image from default gallery views but never
/// deletes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    /// Pack shot: complete product on a uniform or plain background.
    Product,
    /// Genuine environment: room, furniture, person.
    Lifestyle,
    /// Partial/detail shot, zoom, exploded view.
    Other,
    /// Different variant, bare logo, icon, or otherwise irrelevant.
    Unwanted,
}

impl ImageCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImageCategory::Product => "product",
            ImageCategory::Lifestyle => "lifestyle",
            ImageCategory::Other => "other",
            ImageCategory::Unwanted => "unwanted",
        }
    }

    /// Parses the classifier's string category. Unknown strings map to
    /// `Unwanted` so a creative model answer can never surface an image the
    /// caller asked to hide.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "product" => ImageCategory::Product,
            "lifestyle" => ImageCategory::Lifestyle,
            "other" => ImageCategory::Other,
            _ => ImageCategory::Unwanted,
        }
    }
}

impl std::fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A brand record as the pipeline sees it: read-only, owned by the catalog.
///
/// `ai_prompt` is a brand-specific instruction block substituted into model
/// prompts in place of the generic "find the official site" guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandProfile {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub ai_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Common shape every barcode-lookup source is normalized into before
/// validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrichedProductData {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl EnrichedProductData {
    /// A lookup result is usable only if it carries a non-empty name.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_lenient_known_values() {
        assert_eq!(ImageCategory::parse_lenient("product"), ImageCategory::Product);
        assert_eq!(
            ImageCategory::parse_lenient(" Lifestyle "),
            ImageCategory::Lifestyle
        );
        assert_eq!(ImageCategory::parse_lenient("other"), ImageCategory::Other);
        assert_eq!(
            ImageCategory::parse_lenient("unwanted"),
            ImageCategory::Unwanted
        );
    }

    #[test]
    fn category_parse_lenient_unknown_maps_to_unwanted() {
        assert_eq!(
            ImageCategory::parse_lenient("hero-banner"),
            ImageCategory::Unwanted
        );
        assert_eq!(ImageCategory::parse_lenient(""), ImageCategory::Unwanted);
    }

    #[test]
    fn enriched_data_requires_name() {
        let mut data = EnrichedProductData::default();
        assert!(!data.is_valid());
        data.name = Some("  ".to_string());
        assert!(!data.is_valid());
        data.name = Some("Sub Mini".to_string());
        assert!(data.is_valid());
    }

    #[test]
    fn mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&EnrichmentMode::Metas).unwrap(),
            "\"metas\""
        );
        assert_eq!(
            serde_json::from_str::<EnrichmentMode>("\"images\"").unwrap(),
            EnrichmentMode::Images
        );
    }
}
