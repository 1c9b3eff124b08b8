use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const BARCODE: &str = "9780201896831";

fn chain_for(
    server: &MockServer,
    upc_key: Option<&str>,
    barcode_key: Option<&str>,
    ai: Option<AnthropicClient>,
) -> LookupChain {
    LookupChain::with_base_urls(
        upc_key.map(ToString::to_string),
        barcode_key.map(ToString::to_string),
        ai,
        &server.uri(),
        &server.uri(),
        &server.uri(),
    )
    .expect("chain construction should not fail")
}

#[tokio::test]
async fn first_source_hit_short_circuits_the_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/product/{BARCODE}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 1,
            "product": {
                "product_name": "The Art of Computer Programming",
                "brands": "Addison-Wesley",
                "categories_tags": ["en:books"],
            },
        })))
        .mount(&server)
        .await;
    // Later sources must never be called when the first one hits.
    Mock::given(method("GET"))
        .and(path_regex(r"^/product/.*"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/products"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let chain = chain_for(&server, Some("upc-key"), Some("bl-key"), None);
    let result = chain.lookup(BARCODE).await.expect("should find the book");
    assert_eq!(result.source, LookupSource::Openfoodfacts);
    assert_eq!(
        result.data.name.as_deref(),
        Some("The Art of Computer Programming")
    );
    assert_eq!(result.data.category.as_deref(), Some("books"));
}

#[tokio::test]
async fn keyless_sources_are_skipped_and_chain_falls_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/product/{BARCODE}.json")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": 0 })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": [{
                "title": "Sonos Sub Mini",
                "brand": "Sonos",
                "category": "Audio",
                "images": ["https://c.example/sub-mini.jpg"],
            }],
        })))
        .mount(&server)
        .await;

    // No UPC Database key: the chain must jump straight to Barcode Lookup.
    let chain = chain_for(&server, None, Some("bl-key"), None);
    let result = chain.lookup(BARCODE).await.expect("should fall through");
    assert_eq!(result.source, LookupSource::Barcodelookup);
    assert_eq!(
        result.data.image_url.as_deref(),
        Some("https://c.example/sub-mini.jpg")
    );
}

#[tokio::test]
async fn nameless_result_fails_validation_and_chain_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/product/{BARCODE}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 1,
            "product": { "product_name": "   ", "brands": "Someone" },
        })))
        .mount(&server)
        .await;

    let chain = chain_for(&server, None, None, None);
    assert!(chain.lookup(BARCODE).await.is_none());
}

#[tokio::test]
async fn model_fallback_is_the_last_resort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/product/{BARCODE}.json")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": 0 })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": "{\"name\": \"Sonos Sub Mini\", \"manufacturer\": \"Sonos\", \
                         \"category\": \"Electronics\", \"image_url\": null, \
                         \"description\": \"Compact wireless subwoofer\"}",
            }],
        })))
        .mount(&server)
        .await;

    let ai = AnthropicClient::with_base_url("test-key", "test-model", 10, &server.uri())
        .expect("client construction should not fail");
    let chain = chain_for(&server, None, None, Some(ai));
    let result = chain.lookup(BARCODE).await.expect("model should answer");
    assert_eq!(result.source, LookupSource::Llm);
    assert_eq!(result.data.manufacturer.as_deref(), Some("Sonos"));
}

#[tokio::test]
async fn source_status_reflects_configured_keys() {
    let server = MockServer::start().await;
    let chain = chain_for(&server, Some("upc-key"), None, None);
    let status = chain.source_status();
    assert!(status.openfoodfacts);
    assert!(status.upcdatabase);
    assert!(!status.barcodelookup);
    assert!(!status.llm);
}
