//! Free-form model fallback: last resort when every database misses.

use stockbook_ai::{strip_code_fences, AnthropicClient};
use stockbook_core::EnrichedProductData;

use crate::error::LookupError;

const MAX_TOKENS: u32 = 1_024;

fn build_prompt(barcode: &str) -> String {
    format!(
        "You are an assistant specialised in identifying commercial products.\n\n\
         Barcode: {barcode}\n\n\
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

/// Asks the model to identify a barcode from its own knowledge.
///
/// Returns `Ok(None)` when the reply parses but carries no product name.
///
/// # Errors
///
/// Returns [`LookupError::Ai`] on API failure or an unparsable reply.
pub async fn fetch_llm(
    client: &AnthropicClient,
    barcode: &str,
) -> Result<Option<EnrichedProductData>, LookupError> {
    let raw = client.complete(&build_prompt(barcode), MAX_TOKENS).await?;
    let text = strip_code_fences(&raw);

    let data: EnrichedProductData =
        serde_json::from_str(text).map_err(|e| stockbook_ai::AiError::SynthesisFailed {
            reason: format!("malformed JSON: {e}"),
            raw: raw.clone(),
        })?;

    if data.is_valid() {
        Ok(Some(data))
    } else {
        Ok(None)
    }
}
