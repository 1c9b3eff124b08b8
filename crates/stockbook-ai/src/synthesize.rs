//! Content synthesis: scraped page + product context in, field values out.
//!
//! The result shape is decided here, not at the call site: a full-copy long
//! description over a successfully scraped page comes back as
//! [`Synthesized::Html`], everything else as [`Synthesized::Json`] keyed by
//! the requested field names.

use crate::client::{strip_code_fences, AnthropicClient};
use crate::error::AiError;

const FIELDS_MAX_TOKENS: u32 = 2_000;
const FULL_COPY_MAX_TOKENS: u32 = 4_096;

/// How the long description should be produced when requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisStyle {
    /// Structured JSON values for the requested fields.
    Structured,
    /// Reproduce the scraped page as clean HTML, embedding already-uploaded
    /// image URLs. Falls back to `Structured` when no page was scraped.
    FullCopy,
}

/// Input to one synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub product_name: String,
    pub manufacturer: Option<String>,
    pub barcode: Option<String>,
    /// Field keys to fill, e.g. `["short_description", "category"]`.
    pub fields: Vec<String>,
    pub style: SynthesisStyle,
    pub page_title: Option<String>,
    pub page_html: Option<String>,
    /// Public URLs of images already stored for this product, embedded into
    /// full-copy HTML output.
    pub image_urls: Vec<String>,
    pub brand_prompt: Option<String>,
}

/// Synthesizer output, discriminated by the synthesizer itself.
#[derive(Debug, Clone)]
pub enum Synthesized {
    /// A JSON object keyed by requested field names.
    Json(serde_json::Value),
    /// A clean HTML fragment (full-copy long description).
    Html(String),
}

fn wants_html(request: &SynthesisRequest) -> bool {
    request.style == SynthesisStyle::FullCopy && request.page_html.is_some()
}

fn push_context(prompt: &mut String, request: &SynthesisRequest) {
    prompt.push_str("PRODUCT:\n");
    prompt.push_str(&format!("- Name: {}\n", request.product_name));
    if let Some(manufacturer) = &request.manufacturer {
        prompt.push_str(&format!("- Manufacturer: {manufacturer}\n"));
    }
    if let Some(barcode) = &request.barcode {
        prompt.push_str(&format!("- Barcode: {barcode}\n"));
    }
    if let Some(brand_prompt) = &request.brand_prompt {
        prompt.push_str(&format!("\nBRAND INSTRUCTIONS:\n{brand_prompt}\n"));
    }
    if let Some(title) = &request.page_title {
        prompt.push_str(&format!("\nSCRAPED PAGE TITLE: {title}\n"));
    }
    if let Some(html) = &request.page_html {
        prompt.push_str(&format!("\nSCRAPED PAGE CONTENT:\n{html}\n"));
    }
}

fn build_fields_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = String::from(
        "You are an expert assistant for technology and consumer product data.\n\n",
    );
    push_context(&mut prompt, request);
    prompt.push_str(&format!(
        "\nFill in the following fields for this product: {}.\n\n\
         RULES:\n\
         - Prefer information from the scraped page when provided; otherwise use \
         official manufacturer information.\n\
         - Numeric fields must be bare JSON numbers, not strings.\n\
         - Boolean-like technical specs must be the literal strings \"true\" or \
         \"false\", not JSON booleans.\n\
         - short_description: one sentence, at most 150 characters.\n\
         - long_description: detailed copy with the technical specifications.\n\n\
         Respond with ONLY a single JSON object whose keys are exactly the \
         requested field names. No text before or after the JSON.",
        request.fields.join(", ")
    ));
    prompt
}

fn build_full_copy_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = String::from(
        "You are an expert assistant for technology and consumer product data.\n\n",
    );
    push_context(&mut prompt, request);
    if !request.image_urls.is_empty() {
        prompt.push_str("\nSTORED PRODUCT IMAGES:\n");
        for url in &request.image_urls {
            prompt.push_str(&format!("- {url}\n"));
        }
    }
    prompt.push_str(
        "\nReproduce this product page as a clean HTML fragment for a product \
         long description.\n\n\
         RULES:\n\
         - Keep the page's structure: headings, paragraphs, spec lists.\n\
         - Use only h2, h3, p, ul, ol, li, strong, em and img tags.\n\
         - Embed the stored product images above with <img> tags where they fit \
         the content; never reference any other image URL.\n\
         - No scripts, styles, classes, or inline attributes other than img src \
         and alt.\n\n\
         Respond with ONLY the HTML fragment. No markdown, no commentary.",
    );
    prompt
}

/// Runs one synthesis call and parses the reply.
///
/// # Errors
///
/// - [`AiError::SynthesisFailed`] when the reply is empty or, in JSON mode,
///   not a JSON object. Terminal; the raw text is carried for debugging.
/// - [`AiError::Api`] / [`AiError::Http`] on API or transport failure.
pub async fn synthesize(
    client: &AnthropicClient,
    request: &SynthesisRequest,
) -> Result<Synthesized, AiError> {
    if wants_html(request) {
        let prompt = build_full_copy_prompt(request);
        let raw = client.complete(&prompt, FULL_COPY_MAX_TOKENS).await?;
        let html = strip_code_fences(&raw).to_string();
        if html.is_empty() {
            return Err(AiError::SynthesisFailed {
                reason: "empty HTML reply".to_string(),
                raw,
            });
        }
        tracing::info!(
            product_name = request.product_name,
            bytes = html.len(),
            "full-copy description synthesized"
        );
        return Ok(Synthesized::Html(html));
    }

    let prompt = build_fields_prompt(request);
    let raw = client.complete(&prompt, FIELDS_MAX_TOKENS).await?;
    let text = strip_code_fences(&raw);

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| AiError::SynthesisFailed {
            reason: format!("malformed JSON: {e}"),
            raw: raw.clone(),
        })?;
    if !value.is_object() {
        return Err(AiError::SynthesisFailed {
            reason: "reply is not a JSON object".to_string(),
            raw,
        });
    }

    tracing::info!(
        product_name = request.product_name,
        fields = request.fields.len(),
        "fields synthesized"
    );
    Ok(Synthesized::Json(value))
}
