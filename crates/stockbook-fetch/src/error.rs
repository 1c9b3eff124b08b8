use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("browser error for {url}: {reason}")]
    Browser { url: String, reason: String },

    #[error("navigation timed out after {budget_secs}s for {url}")]
    Timeout { url: String, budget_secs: u64 },
}
