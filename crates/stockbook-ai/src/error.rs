use thiserror::Error;

/// Errors returned by the model-backed enrichment calls.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-2xx status with an error message.
    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response contained no usable text block.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model's answer does not look like a URL. Carries the raw output
    /// for diagnostics; never retried.
    #[error("model did not produce a usable URL: {raw}")]
    NoUrlFound { raw: String },

    /// The synthesized content was missing or unparsable. Terminal: the raw
    /// text is surfaced for debugging, not retried.
    #[error("synthesis failed ({reason}): {raw}")]
    SynthesisFailed { reason: String, raw: String },

    /// The whole classification batch could not be parsed.
    #[error("classification failed ({reason}): {raw}")]
    ClassificationFailed { reason: String, raw: String },

    /// The configured base URL is not a valid URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
