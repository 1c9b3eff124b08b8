use thiserror::Error;

/// Per-image failures in the ingest pipeline. These are recorded per item
/// and never abort the batch.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Network or TLS failure while downloading.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The image URL answered with a non-2xx status.
    #[error("download failed with status {status}")]
    Status { status: u16 },

    /// Declared content type the object store cannot serve (AVIF).
    #[error("unsupported content type: {0}")]
    UnsupportedFormat(String),

    /// The bytes could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Both edges under the stored-image minimum; treated as an icon or
    /// placeholder.
    #[error("image too small: {width}x{height}")]
    TooSmall { width: u32, height: u32 },

    /// Normalization produced an empty buffer. Hard failure, not retried.
    #[error("empty output buffer after normalization")]
    EmptyOutput,

    /// The object store rejected the upload.
    #[error("storage upload failed (status {status}): {message}")]
    Storage { status: u16, message: String },

    /// The image row could not be persisted.
    #[error("database error: {0}")]
    Db(#[from] stockbook_db::DbError),

    /// The configured storage base URL is not a valid URL.
    #[error("invalid storage URL: {0}")]
    InvalidStorageUrl(String),
}
