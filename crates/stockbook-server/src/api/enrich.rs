use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use stockbook_core::EnrichedProductData;
use stockbook_lookup::LookupSource;

use super::{ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ByBarcodeRequest {
    barcode: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ByBarcodeResponse {
    success: bool,
    source: Option<LookupSource>,
    data: EnrichedProductData,
    response_time_ms: u128,
}

/// Runs the lookup chain for one barcode. A miss is an expected outcome:
/// the response is `success: false` with an empty data shell, not an HTTP
/// error.
pub(super) async fn enrich_by_barcode(
    State(state): State<AppState>,
    Json(request): Json<ByBarcodeRequest>,
) -> Result<Json<ByBarcodeResponse>, ApiFailure> {
    let barcode = request.barcode.trim();
    if barcode.is_empty() {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "barcode must not be empty",
        ));
    }

    let started = Instant::now();
    let outcome = state.lookup.lookup(barcode).await;
    let response_time_ms = started.elapsed().as_millis();

    Ok(Json(match outcome {
        Some(result) => ByBarcodeResponse {
            success: true,
            source: Some(result.source),
            data: result.data,
            response_time_ms,
        },
        None => ByBarcodeResponse {
            success: false,
            source: None,
            data: EnrichedProductData::default(),
            response_time_ms,
        },
    }))
}
