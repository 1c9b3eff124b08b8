//! Product-page URL resolution.
//!
//! One model call asking for a bare URL. A brand can override the generic
//! guidance with its own instructions (e.g. "always use the fr-BE store").
//! Never retried: callers decide whether to surface the failure or fall back
//! to another enrichment mode.

use crate::client::AnthropicClient;
use crate::error::AiError;

const GENERIC_GUIDANCE: &str = "Find the product page on the manufacturer's OFFICIAL website \
(e.g. apple.com, ubiquiti.com). Prefer the official page over retailers or marketplaces. \
If several variants exist, pick the most common one.";

const MAX_TOKENS: u32 = 300;

fn build_prompt(product_name: &str, barcode: Option<&str>, brand_prompt: Option<&str>) -> String {
    let guidance = brand_prompt.unwrap_or(GENERIC_GUIDANCE);
    let barcode = barcode.unwrap_or("not provided");
    format!(
        "You are a product research assistant.\n\n\
         PRODUCT:\n\
         - Name: {product_name}\n\
         - Barcode: {barcode}\n\n\
         {guidance}\n\n\
         Respond with ONLY the full URL of the product page. No explanation, \
         no markdown, no other text."
    )
}

/// Asks the model for the product's official page URL.
///
/// # Errors
///
/// - [`AiError::NoUrlFound`] if the reply does not start with `http`; the
///   raw model output is carried for diagnostics.
/// - [`AiError::Api`] / [`AiError::Http`] on API or transport failure.
pub async fn resolve_product_url(
    client: &AnthropicClient,
    product_name: &str,
    barcode: Option<&str>,
    brand_prompt: Option<&str>,
) -> Result<String, AiError> {
    let prompt = build_prompt(product_name, barcode, brand_prompt);
    let raw = client.complete(&prompt, MAX_TOKENS).await?;

    let url = raw.trim();
    if url.starts_with("http") {
        tracing::info!(product_name, url, "product URL resolved");
        Ok(url.to_string())
    } else {
        tracing::warn!(product_name, raw = url, "model reply is not a URL");
        Err(AiError::NoUrlFound {
            raw: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
        })
    }

    async fn client_for(server: &MockServer) -> AnthropicClient {
        AnthropicClient::with_base_url("test-key", "test-model", 10, &server.uri())
            .expect("client construction should not fail")
    }

    #[test]
    fn brand_prompt_replaces_generic_guidance() {
        let prompt = build_prompt("Sub Mini", None, Some("Only use sonos.com/fr-be."));
        assert!(prompt.contains("Only use sonos.com/fr-be."));
        assert!(!prompt.contains("OFFICIAL website"));
    }

    #[tokio::test]
    async fn accepts_a_plain_url_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply("https://www.sonos.com/fr-be/shop/sub-mini")),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let url = resolve_product_url(&client, "Sonos Sub Mini", None, None)
            .await
            .expect("should resolve");
        assert_eq!(url, "https://www.sonos.com/fr-be/shop/sub-mini");
    }

    #[tokio::test]
    async fn prose_reply_is_no_url_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                "I could not find an official page for this product.",
            )))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = resolve_product_url(&client, "Mystery Widget", Some("123"), None).await;
        match result {
            Err(AiError::NoUrlFound { raw }) => assert!(raw.contains("could not find")),
            other => panic!("expected NoUrlFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_error_is_surfaced_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "rate_limit_error", "message": "Too many requests" },
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = resolve_product_url(&client, "Sub Mini", None, None).await;
        match result {
            Err(AiError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Too many requests");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
