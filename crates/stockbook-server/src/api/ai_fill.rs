use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use stockbook_ai::AnthropicClient;
use stockbook_core::{EnrichmentMode, FilterType};
use stockbook_enrich::{EnrichmentRequest, Orchestrator};

use super::{ApiFailure, AppState, AI_TIMEOUT_SECS};

#[derive(Debug, Deserialize)]
pub(super) struct AiFillRequest {
    product_id: Uuid,
    #[serde(default = "default_mode")]
    mode: EnrichmentMode,
    target_field: Option<String>,
    #[serde(default)]
    filter_type: FilterType,
    /// Render the product page in a browser. Defaults on: most brand sites
    /// build their galleries client-side.
    #[serde(default = "default_headless")]
    headless: bool,
    /// Synthesize the long description as rich HTML grounded in the
    /// scraped product page.
    #[serde(default)]
    full_copy: bool,
    /// Per-request model credentials; the server default applies when
    /// absent.
    api_key: Option<String>,
    model: Option<String>,
}

fn default_mode() -> EnrichmentMode {
    EnrichmentMode::All
}

const fn default_headless() -> bool {
    true
}

/// Resolves the orchestrator for this request: the shared one, or a fresh
/// one when the caller overrides the API key or model.
fn request_orchestrator(
    state: &AppState,
    api_key: Option<&str>,
    model: Option<&str>,
) -> Result<Arc<Orchestrator>, ApiFailure> {
    if api_key.is_none() && model.is_none() {
        return state
            .orchestrator
            .clone()
            .ok_or_else(ApiFailure::ai_not_configured);
    }

    let key = api_key
        .or(state.config.anthropic_api_key.as_deref())
        .ok_or_else(ApiFailure::ai_not_configured)?;
    let model = model.unwrap_or(&state.config.ai_model);
    let client =
        AnthropicClient::with_base_url(key, model, AI_TIMEOUT_SECS, &state.config.ai_base_url)
            .map_err(|e| ApiFailure::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Arc::new(Orchestrator::new(
        state.pool.clone(),
        Arc::new(client),
        Arc::clone(&state.static_fetcher),
        Arc::clone(&state.headless_fetcher),
        Arc::clone(&state.images),
    )))
}

/// Runs the orchestrator for one product. The response always carries the
/// run's progress; a failed run keeps `status 500` with the failing step in
/// `debug_info`.
pub(super) async fn ai_fill(
    State(state): State<AppState>,
    Json(request): Json<AiFillRequest>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let orchestrator =
        request_orchestrator(&state, request.api_key.as_deref(), request.model.as_deref())?;

    let outcome = orchestrator
        .run(EnrichmentRequest {
            product_id: request.product_id,
            mode: request.mode,
            filter: request.filter_type,
            fields: request.target_field.into_iter().collect(),
            headless: request.headless,
            full_copy: request.full_copy,
        })
        .await;

    let succeeded = outcome.succeeded();
    let body = serde_json::json!({
        "success": succeeded,
        "enrichment_id": outcome.enrichment_id,
        "data": {
            "product_url": outcome.product_url,
            "metas": outcome.metas,
            "images": outcome.images,
        },
        "progress": outcome.progress,
    });

    if succeeded {
        Ok(Json(body))
    } else {
        let step = outcome
            .progress
            .failed_step
            .map_or("unknown", stockbook_enrich::Step::as_str);
        let message = outcome.progress.message.clone().unwrap_or_default();
        let mut failure = ApiFailure::new(StatusCode::INTERNAL_SERVER_ERROR, message.clone());
        failure.debug_info = Some(serde_json::json!({
            "step": step,
            "message": message,
            "progress": body["progress"],
            "data": body["data"],
        }));
        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_fill_request_applies_defaults() {
        let request: AiFillRequest = serde_json::from_value(serde_json::json!({
            "product_id": "6f7b9b2e-8f4a-4d57-9c1e-2a6b3c4d5e6f",
        }))
        .expect("deserialize");
        assert_eq!(request.mode, EnrichmentMode::All);
        assert!(request.headless);
        assert!(!request.full_copy);
        assert!(request.api_key.is_none());
        assert!(request.model.is_none());
    }

    #[test]
    fn ai_fill_request_accepts_full_copy_and_overrides() {
        let request: AiFillRequest = serde_json::from_value(serde_json::json!({
            "product_id": "6f7b9b2e-8f4a-4d57-9c1e-2a6b3c4d5e6f",
            "mode": "metas",
            "full_copy": true,
            "api_key": "sk-other",
            "model": "claude-3-5-haiku-latest",
        }))
        .expect("deserialize");
        assert_eq!(request.mode, EnrichmentMode::Metas);
        assert!(request.full_copy);
        assert_eq!(request.api_key.as_deref(), Some("sk-other"));
        assert_eq!(request.model.as_deref(), Some("claude-3-5-haiku-latest"));
    }
}
