//! Product-image pipeline: download candidates, normalize to JPEG, upload
//! to object storage, and persist the image rows.

pub mod error;
pub mod ingest;
pub mod normalize;
pub mod storage;

pub use error::ImageError;
pub use ingest::{ImagePipeline, ImageResult, IngestReport};
pub use normalize::{normalize_to_jpeg, NormalizedImage, JPEG_QUALITY};
pub use storage::StorageClient;
