//! Static fetch path: plain HTTP GET plus DOM-tree parsing.
//!
//! No JavaScript runs here. Sites that lazy-render their galleries need the
//! headless path; this one covers server-rendered product pages at a
//! fraction of the cost.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::candidates::{
    first_srcset_candidate, is_excluded, passes_edge_threshold, resolve_image_url, CandidateSet,
    BASE_EXCLUDE_KEYWORDS,
};
use crate::error::FetchError;
use crate::types::{CandidateImage, ScrapedPage, Section};

static MAIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main, article, .product, .product-detail, .product-page, #main-content, #content")
        .expect("valid selector")
});
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static CONTENT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, p, ul, ol, img").expect("valid selector"));
static LI_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid selector"));
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img, picture source").expect("valid selector"));

/// Paragraphs shorter than this are treated as navigation noise.
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Element names whose subtrees never contribute content or candidates.
const EXCLUDED_ANCESTORS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];
/// Class-name fragments marking boilerplate containers (cookie banners,
/// newsletter blocks, share widgets).
const EXCLUDED_ANCESTOR_CLASSES: &[&str] = &["cookie", "newsletter", "social-share"];

/// Static-HTML page fetcher.
pub struct StaticFetcher {
    client: reqwest::Client,
}

impl StaticFetcher {
    /// Creates a fetcher with a configured timeout and a realistic browser
    /// user-agent. Sites routinely 403 default library user-agents.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches and parses a page without executing JavaScript.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` does not parse.
    /// - [`FetchError::Status`] on a non-2xx response.
    /// - [`FetchError::Http`] on transport failure.
    pub async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        let page_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(page_url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(
                reqwest::header::ACCEPT_LANGUAGE,
                "en-US,en;q=0.9,fr-FR;q=0.8,fr;q=0.7",
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        tracing::debug!(url, bytes = html.len(), "static page fetched");
        Ok(parse_page(&page_url, &html))
    }
}

/// Parses raw HTML into a [`ScrapedPage`]. Pure so it can be tested without
/// a network.
#[must_use]
pub fn parse_page(page_url: &Url, html: &str) -> ScrapedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let images = collect_candidates(&document, page_url);

    let container = document
        .select(&MAIN_SELECTOR)
        .next()
        .or_else(|| document.select(&BODY_SELECTOR).next());

    let (content_html, sections) = match container {
        Some(container) => build_content(container, page_url),
        None => (String::new(), Vec::new()),
    };

    ScrapedPage {
        html: content_html,
        title,
        images,
        sections,
    }
}

fn extract_title(document: &Html) -> String {
    let h1 = document
        .select(&H1_SELECTOR)
        .next()
        .map(|el| collect_text(el))
        .filter(|t| !t.is_empty());
    h1.or_else(|| {
        document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| collect_text(el))
    })
    .unwrap_or_default()
}

fn collect_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn has_excluded_ancestor(el: ElementRef<'_>) -> bool {
    for node in el.ancestors() {
        let Some(ancestor) = ElementRef::wrap(node) else {
            continue;
        };
        let name = ancestor.value().name();
        if EXCLUDED_ANCESTORS.contains(&name) {
            return true;
        }
        if let Some(class) = ancestor.value().attr("class") {
            let class = class.to_ascii_lowercase();
            if EXCLUDED_ANCESTOR_CLASSES.iter().any(|c| class.contains(c)) {
                return true;
            }
        }
    }
    false
}

/// First URL in the attribute fallback chain used by lazy-loading themes.
fn image_src(el: ElementRef<'_>) -> Option<String> {
    let value = el.value();
    value
        .attr("src")
        .map(ToString::to_string)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| value.attr("data-src").map(ToString::to_string))
        .or_else(|| value.attr("data-lazy-src").map(ToString::to_string))
        .or_else(|| value.attr("data-srcset").and_then(first_srcset_candidate))
        .or_else(|| value.attr("srcset").and_then(first_srcset_candidate))
}

fn parse_dimension(el: ElementRef<'_>, attr: &str) -> Option<u32> {
    el.value()
        .attr(attr)
        .and_then(|raw| raw.trim().trim_end_matches("px").parse::<u32>().ok())
        .filter(|v| *v > 0)
}

fn collect_candidates(document: &Html, page_url: &Url) -> Vec<CandidateImage> {
    let mut set = CandidateSet::new();

    for el in document.select(&IMAGE_SELECTOR) {
        if has_excluded_ancestor(el) {
            continue;
        }
        let Some(raw) = image_src(el) else { continue };
        let Some(url) = resolve_image_url(page_url, &raw) else {
            continue;
        };

        let alt = el.value().attr("alt").unwrap_or_default();
        if is_excluded(&url, alt, BASE_EXCLUDE_KEYWORDS) {
            continue;
        }

        let width = parse_dimension(el, "width");
        let height = parse_dimension(el, "height");
        if !passes_edge_threshold(width, height) {
            continue;
        }

        set.push(CandidateImage { url, width, height });
    }

    set.finalize()
}

/// Walks the container collecting headings, paragraphs, lists, and images
/// into a normalized HTML fragment plus a titled section list.
fn build_content(container: ElementRef<'_>, page_url: &Url) -> (String, Vec<Section>) {
    let mut html = String::new();
    let mut sections: Vec<Section> = Vec::new();

    for el in container.select(&CONTENT_SELECTOR) {
        if has_excluded_ancestor(el) {
            continue;
        }
        let tag = el.value().name();
        match tag {
            "h1" | "h2" | "h3" | "h4" => {
                let heading = collect_text(el);
                if !heading.is_empty() {
                    html.push_str(&format!("<{tag}>{heading}</{tag}>\n"));
                    sections.push(Section {
                        title: heading,
                        content: String::new(),
                    });
                }
            }
            "p" => {
                let text = collect_text(el);
                if text.len() >= MIN_PARAGRAPH_CHARS {
                    if let Some(section) = sections.last_mut() {
                        if !section.content.is_empty() {
                            section.content.push(' ');
                        }
                        section.content.push_str(&text);
                    }
                    html.push_str(&format!("<p>{text}</p>\n"));
                }
            }
            "ul" | "ol" => {
                let items: Vec<String> = el
                    .select(&LI_SELECTOR)
                    .map(collect_text)
                    .filter(|t| !t.is_empty())
                    .collect();
                if !items.is_empty() {
                    html.push_str(&format!("<{tag}>\n"));
                    for item in items {
                        html.push_str(&format!("  <li>{item}</li>\n"));
                    }
                    html.push_str(&format!("</{tag}>\n"));
                }
            }
            "img" => {
                let Some(raw) = image_src(el) else { continue };
                let Some(src) = resolve_image_url(page_url, &raw) else {
                    continue;
                };
                let alt = el.value().attr("alt").unwrap_or("Product image");
                if !is_excluded(&src, alt, BASE_EXCLUDE_KEYWORDS) {
                    html.push_str(&format!("<img src=\"{src}\" alt=\"{alt}\" />\n"));
                }
            }
            _ => {}
        }
    }

    (html, sections)
}

#[cfg(test)]
#[path = "static_fetch_test.rs"]
mod tests;
