//! Batch image classification.
//!
//! One model call covers the whole batch; a parse failure of the reply is
//! terminal for the batch. Unknown category strings from the model are
//! mapped to `unwanted` rather than rejected, so a single creative label
//! cannot sink an otherwise valid reply.

use serde::{Deserialize, Serialize};

use stockbook_core::{FilterType, ImageCategory};

use crate::client::{strip_code_fences, AnthropicClient};
use crate::error::AiError;

const MAX_TOKENS: u32 = 2_000;

/// Per-image verdict, applied as an update to the stored image's type.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub index: usize,
    #[serde(rename = "type")]
    pub category: ImageCategory,
    pub confidence: f64,
    pub reason: String,
    pub matches_product: bool,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    index: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    matches_product: bool,
}

#[derive(Debug, Deserialize)]
struct AnalysesEnvelope {
    analyses: Vec<RawAnalysis>,
}

fn filter_instruction(filter: FilterType) -> &'static str {
    match filter {
        FilterType::All => "",
        FilterType::Product => {
            "ACTIVE FILTER: the user wants ONLY pack-shot product photos.\n\
             Be MAXIMALLY STRICT:\n\
             - Classify as \"product\" ONLY complete-product pack shots on a \
             uniform background.\n\
             - Everything else (lifestyle, details, other) must be classified \
             as \"unwanted\" so it gets removed.\n\n"
        }
        FilterType::Lifestyle => {
            "ACTIVE FILTER: the user wants ONLY lifestyle photos.\n\
             Be MAXIMALLY STRICT:\n\
             - Classify as \"lifestyle\" ONLY genuine in-situ photos with a real \
             environment or person.\n\
             - Everything else (pack shots, details, other) must be classified \
             as \"unwanted\" so it gets removed.\n\n"
        }
    }
}

fn build_prompt(
    urls: &[String],
    product_name: &str,
    description: Option<&str>,
    filter: FilterType,
) -> String {
    let description = description.unwrap_or("Not provided");
    let count = urls.len();
    let url_list = urls
        .iter()
        .enumerate()
        .map(|(i, url)| format!("{i}: {url}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a VERY STRICT expert in e-commerce product image classification.\n\n\
         {filter_instruction}\
         PRODUCT:\n\
         Name: {product_name}\n\
         Description: {description}\n\n\
         There are {count} images to classify. For EACH image determine:\n\n\
         1. IMAGE TYPE (be strict):\n\
         - \"product\": professional pack shot on a UNIFORM background (white, \
         black, grey, solid colour, or plain gradient), complete product \
         visible, catalogue style\n\
         - \"lifestyle\": REAL photo with an environment (room, furniture, \
         person, genuine decor). A plain coloured or gradient background alone \
         is NOT lifestyle\n\
         - \"other\": close-up of a PART of the product, exploded view, \
         technical diagram, port/button detail\n\
         - \"unwanted\": a different product or variant, a logo or icon on its \
         own, a placeholder, anything irrelevant\n\n\
         2. PRODUCT MATCH: does the image really show \"{product_name}\"? Check \
         shape, colour, distinctive features.\n\n\
         3. CONFIDENCE from 0.0 to 1.0.\n\n\
         Respond with ONLY a JSON object in EXACTLY this shape:\n\
         {{\n\
           \"analyses\": [\n\
             {{\"index\": 0, \"type\": \"product\", \"confidence\": 0.95, \
         \"reason\": \"Pack shot on white, complete product\", \
         \"matches_product\": true}}\n\
           ]\n\
         }}\n\n\
         IMAGE URLS:\n{url_list}",
        filter_instruction = filter_instruction(filter),
    )
}

/// Classifies a batch of stored image URLs in one call.
///
/// An empty batch short-circuits to an empty result without touching the
/// API.
///
/// # Errors
///
/// - [`AiError::ClassificationFailed`] if the reply cannot be parsed as the
///   expected envelope. Whole-batch: no partial results are produced.
/// - [`AiError::Api`] / [`AiError::Http`] on API or transport failure.
pub async fn classify_images(
    client: &AnthropicClient,
    urls: &[String],
    product_name: &str,
    description: Option<&str>,
    filter: FilterType,
) -> Result<Vec<ClassificationResult>, AiError> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_prompt(urls, product_name, description, filter);
    let raw = client.complete(&prompt, MAX_TOKENS).await?;
    let text = strip_code_fences(&raw);

    let envelope: AnalysesEnvelope =
        serde_json::from_str(text).map_err(|e| AiError::ClassificationFailed {
            reason: format!("malformed JSON: {e}"),
            raw: raw.clone(),
        })?;

    let results: Vec<ClassificationResult> = envelope
        .analyses
        .into_iter()
        .map(|analysis| ClassificationResult {
            index: analysis.index,
            category: ImageCategory::parse_lenient(&analysis.kind),
            confidence: analysis.confidence,
            reason: analysis.reason,
            matches_product: analysis.matches_product,
        })
        .collect();

    tracing::info!(
        product_name,
        batch = urls.len(),
        classified = results.len(),
        "image batch classified"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
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

    fn urls(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("https://store.example/products/{i}.jpg"))
            .collect()
    }

    async fn client_for(server: &MockServer) -> AnthropicClient {
        AnthropicClient::with_base_url("test-key", "test-model", 10, &server.uri())
            .expect("client construction should not fail")
    }

    #[test]
    fn product_filter_demands_unwanted_reclassification() {
        let prompt = build_prompt(&urls(2), "Sub Mini", None, FilterType::Product);
        assert!(prompt.contains("ACTIVE FILTER"));
        assert!(prompt.contains("must be classified as \"unwanted\""));

        let unfiltered = build_prompt(&urls(2), "Sub Mini", None, FilterType::All);
        assert!(!unfiltered.contains("ACTIVE FILTER"));
    }

    #[tokio::test]
    async fn empty_batch_never_calls_the_api() {
        let server = MockServer::start().await;
        // No mock mounted: a request would 404 and fail the call.
        let client = client_for(&server).await;
        let results = classify_images(&client, &[], "Sub Mini", None, FilterType::All)
            .await
            .expect("empty batch should short-circuit");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn parses_batch_and_maps_unknown_categories_to_unwanted() {
        let server = MockServer::start().await;
        let body = r#"{"analyses": [
            {"index": 0, "type": "product", "confidence": 0.95, "reason": "Pack shot", "matches_product": true},
            {"index": 1, "type": "lifestyle", "confidence": 0.9, "reason": "Living room", "matches_product": true},
            {"index": 2, "type": "hero-banner", "confidence": 0.5, "reason": "Campaign visual", "matches_product": false}
        ]}"#;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(body)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let results = classify_images(&client, &urls(3), "Sub Mini", None, FilterType::All)
            .await
            .expect("should classify");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].category, ImageCategory::Product);
        assert_eq!(results[1].category, ImageCategory::Lifestyle);
        assert_eq!(results[2].category, ImageCategory::Unwanted);
        assert!(!results[2].matches_product);
    }

    #[tokio::test]
    async fn unparsable_reply_fails_the_whole_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply("The first image is a pack shot, the second...")),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = classify_images(&client, &urls(2), "Sub Mini", None, FilterType::All).await;
        assert!(matches!(
            result,
            Err(AiError::ClassificationFailed { .. })
        ));
    }
}
