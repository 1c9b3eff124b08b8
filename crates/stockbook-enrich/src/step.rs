//! The orchestration step machine.
//!
//! Every legal ordering is written out in [`can_transition`]; the run loop
//! refuses anything else, so a mode cannot silently skip or repeat a stage.

use serde::Serialize;

/// One stage of an enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Idle,
    FetchingMetas,
    FindingUrl,
    ScrapingPage,
    DownloadingImages,
    ClassifyingImages,
    SettingFeatured,
    Complete,
    Error,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingMetas => "fetching_metas",
            Self::FindingUrl => "finding_url",
            Self::ScrapingPage => "scraping_page",
            Self::DownloadingImages => "downloading_images",
            Self::ClassifyingImages => "classifying_images",
            Self::SettingFeatured => "setting_featured",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The transition table. Any step may fail into `Error`; the metadata path
/// jumps from `idle` or from a finished metadata stage into the image path
/// when the mode covers both.
#[must_use]
pub fn can_transition(from: Step, to: Step) -> bool {
    use Step::{
        ClassifyingImages, Complete, DownloadingImages, Error, FetchingMetas, FindingUrl, Idle,
        ScrapingPage, SettingFeatured,
    };
    if to == Error {
        return from != Error && from != Complete;
    }
    matches!(
        (from, to),
        (Idle, FetchingMetas | FindingUrl)
            | (FetchingMetas, Complete | FindingUrl)
            | (FindingUrl, ScrapingPage)
            | (ScrapingPage, DownloadingImages)
            | (DownloadingImages, ClassifyingImages)
            | (ClassifyingImages, SettingFeatured)
            | (SettingFeatured, Complete)
    )
}
