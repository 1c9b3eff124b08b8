use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use stockbook_ai::{AiError, ClassificationResult};
use stockbook_core::FilterType;

use super::{ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ClassifyRequest {
    image_urls: Vec<String>,
    product_name: String,
    product_description: Option<String>,
    #[serde(default)]
    filter_type: FilterType,
}

#[derive(Debug, Serialize)]
pub(super) struct ClassifyResponse {
    success: bool,
    analyses: Vec<ClassificationResult>,
}

pub(super) fn map_ai_error(error: &AiError) -> ApiFailure {
    let status = match error {
        AiError::Api { status, .. } if *status == 429 => StatusCode::TOO_MANY_REQUESTS,
        AiError::ClassificationFailed { .. }
        | AiError::SynthesisFailed { .. }
        | AiError::EmptyResponse => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiFailure::new(status, error.to_string())
}

/// Classifies a batch of image URLs against the product context.
pub(super) async fn classify_images(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiFailure> {
    let Some(ai) = &state.ai else {
        return Err(ApiFailure::ai_not_configured());
    };
    if request.image_urls.is_empty() {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "image_urls must not be empty",
        ));
    }

    let analyses = stockbook_ai::classify_images(
        ai,
        &request.image_urls,
        &request.product_name,
        request.product_description.as_deref(),
        request.filter_type,
    )
    .await
    .map_err(|e| map_ai_error(&e))?;

    Ok(Json(ClassifyResponse {
        success: true,
        analyses,
    }))
}
