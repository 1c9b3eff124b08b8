mod app_config;
mod config;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use types::{
    BrandProfile, EnrichedProductData, EnrichmentMode, FilterType, ImageCategory,
};

/// Canonical minimum edge (px) for a scrape-time image candidate whose
/// dimensions are known. Candidates with unknown dimensions pass through and
/// are checked again at decode time.
pub const MIN_CANDIDATE_EDGE: u32 = 400;

/// Canonical minimum edge (px) enforced at download/decode time. Anything
/// smaller on both edges is treated as an icon or placeholder.
pub const MIN_STORED_EDGE: u32 = 50;

/// Maximum number of image candidates a scrape may return.
pub const MAX_IMAGE_CANDIDATES: usize = 25;
