use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use stockbook_core::EnrichedProductData;

use super::{classify::map_ai_error, ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ByImageRequest {
    /// Base64-encoded image bytes, without a `data:` prefix.
    image_base64: String,
    /// e.g. `image/jpeg` or `image/png`.
    media_type: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ByImageResponse {
    success: bool,
    /// Text the vision pass could read from the photo.
    text: String,
    data: EnrichedProductData,
    response_time_ms: u128,
}

/// Identifies a product from a photo: OCR via the vision model, then a
/// structured identification pass over the extracted text. Like the barcode
/// chain, "nothing identifiable" is `success: false`, not an HTTP error.
pub(super) async fn enrich_by_image(
    State(state): State<AppState>,
    Json(request): Json<ByImageRequest>,
) -> Result<Json<ByImageResponse>, ApiFailure> {
    let Some(ai) = &state.ai else {
        return Err(ApiFailure::ai_not_configured());
    };
    if request.image_base64.trim().is_empty() {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "image_base64 must not be empty",
        ));
    }

    let started = Instant::now();
    let text = stockbook_ai::extract_image_text(ai, &request.media_type, &request.image_base64)
        .await
        .map_err(|e| map_ai_error(&e))?;
    let identified = stockbook_ai::identify_from_text(ai, &text)
        .await
        .map_err(|e| map_ai_error(&e))?;
    let response_time_ms = started.elapsed().as_millis();

    Ok(Json(match identified {
        Some(data) => ByImageResponse {
            success: true,
            text,
            data,
            response_time_ms,
        },
        None => ByImageResponse {
            success: false,
            text,
            data: EnrichedProductData::default(),
            response_time_ms,
        },
    }))
}
