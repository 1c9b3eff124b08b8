//! OCR-based product identification: a vision pass extracts the text
//! visible in a product photo, then a second pass identifies the product
//! from that text.

use stockbook_core::EnrichedProductData;

use crate::client::{strip_code_fences, AnthropicClient};
use crate::error::AiError;

const OCR_MAX_TOKENS: u32 = 1_000;
const IDENTIFY_MAX_TOKENS: u32 = 1_024;

const OCR_PROMPT: &str = "Extract all text visible in this image. Include barcodes, prices, \
     product names, and any other textual information. Respond with the extracted text only, \
     no commentary.";

fn build_identify_prompt(extracted_text: &str) -> String {
    format!(
        "You are an assistant specialised in identifying commercial products.\n\n\
         Text extracted from a photo of the product:\n{extracted_text}\n\n\
         Identify this product and return a valid JSON object with these keys:\n\
         - name: full product name (required)\n\
         - manufacturer: main manufacturer or brand\n\
         - category: main product category, generic terms (e.g. \"Electronics\", \
         \"Food\", \"Textile\")\n\
         - image_url: a product image URL if known\n\
         - description: short product description\n\
         - metadata: object with other relevant facts (indicative price, \
         dimensions, weight, ...)\n\n\
         IMPORTANT:\n\
         - Respond with ONLY the JSON, no other text.\n\
         - Use null for anything you cannot determine.\n\
         - Prefer official manufacturer information."
    )
}

/// Runs the vision pass over one base64-encoded image and returns the text
/// the model could read from it.
///
/// # Errors
///
/// - [`AiError::Api`] if the API returns a non-2xx status.
/// - [`AiError::Http`] on network failure.
/// - [`AiError::EmptyResponse`] if the reply carries no text block.
pub async fn extract_image_text(
    client: &AnthropicClient,
    media_type: &str,
    base64_data: &str,
) -> Result<String, AiError> {
    let text = client
        .complete_with_image(OCR_PROMPT, media_type, base64_data, OCR_MAX_TOKENS)
        .await?;
    Ok(text.trim().to_string())
}

/// Identifies a product from OCR-extracted text.
///
/// Returns `Ok(None)` when the reply parses but carries no product name.
///
/// # Errors
///
/// - [`AiError::SynthesisFailed`] if the reply is not the requested JSON
///   object; the raw reply is preserved for debugging.
/// - [`AiError::Api`] / [`AiError::Http`] on call failure.
pub async fn identify_from_text(
    client: &AnthropicClient,
    extracted_text: &str,
) -> Result<Option<EnrichedProductData>, AiError> {
    let raw = client
        .complete(&build_identify_prompt(extracted_text), IDENTIFY_MAX_TOKENS)
        .await?;
    let text = strip_code_fences(&raw);

    let data: EnrichedProductData =
        serde_json::from_str(text).map_err(|e| AiError::SynthesisFailed {
            reason: format!("malformed JSON: {e}"),
            raw: raw.clone(),
        })?;

    if data.is_valid() {
        Ok(Some(data))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> AnthropicClient {
        AnthropicClient::with_base_url("sk-test", "claude-test", 5, base)
            .expect("client construction should not fail")
    }

    fn text_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{ "type": "text", "text": text }]
        }))
    }

    #[tokio::test]
    async fn ocr_sends_the_image_as_a_base64_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_string_contains("\"type\":\"image\""))
            .and(body_string_contains("\"media_type\":\"image/jpeg\""))
            .respond_with(text_reply("  SONOS Sub Mini\nEAN 9780201896831  "))
            .expect(1)
            .mount(&server)
            .await;

        let text = extract_image_text(&client(&server.uri()), "image/jpeg", "aGVsbG8=")
            .await
            .expect("should extract");
        assert_eq!(text, "SONOS Sub Mini\nEAN 9780201896831");
    }

    #[tokio::test]
    async fn identify_parses_a_fenced_json_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(text_reply(
                "```json\n{\"name\": \"Sub Mini\", \"manufacturer\": \"Sonos\"}\n```",
            ))
            .mount(&server)
            .await;

        let data = identify_from_text(&client(&server.uri()), "SONOS Sub Mini")
            .await
            .expect("should identify")
            .expect("should carry a name");
        assert_eq!(data.name.as_deref(), Some("Sub Mini"));
        assert_eq!(data.manufacturer.as_deref(), Some("Sonos"));
    }

    #[tokio::test]
    async fn identify_without_a_name_is_a_miss_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(text_reply("{\"name\": null, \"category\": \"Food\"}"))
            .mount(&server)
            .await;

        let data = identify_from_text(&client(&server.uri()), "illegible receipt")
            .await
            .expect("should identify");
        assert!(data.is_none());
    }
}
