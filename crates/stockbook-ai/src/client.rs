//! HTTP client for the Anthropic Messages API.
//!
//! Wraps `reqwest` with API key management, versioned headers, and typed
//! response handling. Every enrichment call in this crate goes through
//! [`AnthropicClient::complete`], which sends a single user message and
//! returns the first text block of the reply.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::AiError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct BlockMessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<BlockMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct BlockMessage<'a> {
    role: &'static str,
    content: Vec<ContentBlockParam<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlockParam<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the Anthropic Messages API.
///
/// Use [`AnthropicClient::new`] for production or
/// [`AnthropicClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl AnthropicClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AiError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`AiError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| AiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
        })
    }

    /// The default model used when no per-call override is given.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a single user message with the configured default model.
    ///
    /// # Errors
    ///
    /// - [`AiError::Api`] if the API returns a non-2xx status.
    /// - [`AiError::Http`] on network failure.
    /// - [`AiError::EmptyResponse`] if the reply carries no text block.
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, AiError> {
        self.complete_as(&self.model, prompt, max_tokens).await
    }

    /// Same as [`complete`](Self::complete) with a per-call model override.
    ///
    /// # Errors
    ///
    /// See [`complete`](Self::complete).
    pub async fn complete_as(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let request = MessagesRequest {
            model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        self.post_messages(&request).await
    }

    /// Sends a prompt together with one base64-encoded image, for
    /// vision-based extraction.
    ///
    /// # Errors
    ///
    /// See [`complete`](Self::complete).
    pub async fn complete_with_image(
        &self,
        prompt: &str,
        media_type: &str,
        base64_data: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let request = BlockMessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![BlockMessage {
                role: "user",
                content: vec![
                    ContentBlockParam::Text { text: prompt },
                    ContentBlockParam::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type,
                            data: base64_data,
                        },
                    },
                ],
            }],
        };
        self.post_messages(&request).await
    }

    async fn post_messages<T: Serialize>(&self, request: &T) -> Result<String, AiError> {
        let url = self
            .base_url
            .join("v1/messages")
            .map_err(|e| AiError::InvalidBaseUrl(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map_or(body, |envelope| envelope.error.message);
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response.json().await?;
        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or(AiError::EmptyResponse)
    }
}

/// Strips a Markdown code-fence wrapper (with or without a `json` tag) from
/// a model reply. Models routinely wrap JSON answers despite instructions
/// not to.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::strip_code_fences;

    #[test]
    fn strips_tagged_fence() {
        assert_eq!(
            strip_code_fences("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n<p>hi</p>\n```"), "<p>hi</p>");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
