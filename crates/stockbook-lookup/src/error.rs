use thiserror::Error;

/// Failures inside a single lookup source. The chain logs these and moves
/// to the next source; they never abort a lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network failure, non-2xx status, or an unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model-backed fallback failed.
    #[error("model fallback error: {0}")]
    Ai(#[from] stockbook_ai::AiError),
}
