use url::Url;

use super::*;

fn page_url() -> Url {
    Url::parse("https://shop.example.com/products/sub-mini").unwrap()
}

const SAMPLE: &str = r#"<!doctype html>
<html>
<head><title>Sub Mini | Shop</title></head>
<body>
  <nav><img src="/assets/nav-photo.jpg" alt="nav" /><p>Some long navigation text over twenty chars</p></nav>
  <header><img src="/assets/header-hero.jpg" width="1600" height="900" /></header>
  <main>
    <h1>Sub Mini</h1>
    <p>too short</p>
    <p>A compact wireless subwoofer with deep, dynamic bass.</p>
    <h2>Specifications</h2>
    <ul><li>Height: 305 mm</li><li></li><li>Weight: 6.35 kg</li></ul>
    <img src="/media/sub-mini-front.jpg" width="1200" height="1200" alt="front view" />
    <img data-src="/media/sub-mini-side.jpg" width="1000" height="1000" alt="side view" />
    <img srcset="/media/sub-mini-top-320.jpg 320w, /media/sub-mini-top-640.jpg 640w" alt="top" />
    <img src="/assets/brand-logo.png" width="800" height="800" alt="brand" />
    <img src="/assets/cart-icon.svg" alt="cart" />
    <img src="/media/tiny.jpg" width="64" height="64" alt="swatch" />
    <div class="cookie-banner"><img src="/media/cookie-photo.jpg" width="900" height="900" /></div>
  </main>
  <footer><p>Footer text that is definitely long enough to keep</p></footer>
</body>
</html>"#;

#[test]
fn title_prefers_first_h1() {
    let page = parse_page(&page_url(), SAMPLE);
    assert_eq!(page.title, "Sub Mini");
}

#[test]
fn title_falls_back_to_title_tag() {
    let html = "<html><head><title>Fallback Title</title></head><body><p>x</p></body></html>";
    let page = parse_page(&page_url(), html);
    assert_eq!(page.title, "Fallback Title");
}

#[test]
fn content_drops_short_paragraphs_and_boilerplate() {
    let page = parse_page(&page_url(), SAMPLE);
    assert!(page.html.contains("<h1>Sub Mini</h1>"));
    assert!(page.html.contains("deep, dynamic bass"));
    assert!(!page.html.contains("too short"));
    assert!(!page.html.contains("navigation text"));
    assert!(!page.html.contains("Footer text"));
}

#[test]
fn list_items_are_kept_and_empty_ones_dropped() {
    let page = parse_page(&page_url(), SAMPLE);
    assert!(page.html.contains("<li>Height: 305 mm</li>"));
    assert!(page.html.contains("<li>Weight: 6.35 kg</li>"));
}

#[test]
fn candidates_exclude_keywords_small_images_and_boilerplate_containers() {
    let page = parse_page(&page_url(), SAMPLE);
    let urls: Vec<&str> = page.images.iter().map(|i| i.url.as_str()).collect();

    assert!(urls.contains(&"https://shop.example.com/media/sub-mini-front.jpg"));
    assert!(urls.contains(&"https://shop.example.com/media/sub-mini-side.jpg"));
    // srcset fallback with unknown dimensions passes through.
    assert!(urls.contains(&"https://shop.example.com/media/sub-mini-top-320.jpg"));

    for url in &urls {
        let lower = url.to_ascii_lowercase();
        for keyword in ["icon", "logo", "sprite", "badge"] {
            assert!(!lower.contains(keyword), "{url} contains {keyword}");
        }
    }
    assert!(!urls.contains(&"https://shop.example.com/media/tiny.jpg"));
    assert!(!urls.contains(&"https://shop.example.com/media/cookie-photo.jpg"));
    assert!(!urls.contains(&"https://shop.example.com/assets/nav-photo.jpg"));
}

#[test]
fn candidates_sorted_by_descending_area() {
    let page = parse_page(&page_url(), SAMPLE);
    let areas: Vec<Option<u64>> = page.images.iter().map(CandidateImage::area).collect();
    let known: Vec<u64> = areas.iter().filter_map(|a| *a).collect();
    let mut sorted = known.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(known, sorted);
}

#[test]
fn sections_follow_headings() {
    let page = parse_page(&page_url(), SAMPLE);
    let titles: Vec<&str> = page.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Sub Mini", "Specifications"]);
    assert!(page.sections[0].content.contains("dynamic bass"));
}

mod http {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::FetchError;
    use crate::static_fetch::StaticFetcher;

    #[tokio::test]
    async fn fetch_parses_served_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/sub-mini"))
            .respond_with(ResponseTemplate::new(200).set_body_string(super::SAMPLE))
            .mount(&server)
            .await;

        let fetcher = StaticFetcher::new(10, "test-agent").unwrap();
        let page = fetcher
            .fetch(&format!("{}/products/sub-mini", server.uri()))
            .await
            .expect("fetch should succeed");
        assert_eq!(page.title, "Sub Mini");
        assert!(!page.images.is_empty());
    }

    #[tokio::test]
    async fn non_2xx_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let fetcher = StaticFetcher::new(10, "test-agent").unwrap();
        let result = fetcher.fetch(&format!("{}/blocked", server.uri())).await;
        assert!(
            matches!(result, Err(FetchError::Status { status: 403, .. })),
            "expected Status(403), got: {result:?}"
        );
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let fetcher = StaticFetcher::new(10, "test-agent").unwrap();
        let result = fetcher.fetch("not-a-url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
