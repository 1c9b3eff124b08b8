use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockbook_images::IngestReport;

use super::{ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DownloadImagesRequest {
    image_urls: Vec<String>,
    product_id: Uuid,
}

#[derive(Debug, Serialize)]
pub(super) struct DownloadImagesResponse {
    success: bool,
    #[serde(flatten)]
    report: IngestReport,
}

/// Ingests a batch of image URLs for a product. The batch itself never
/// fails: per-image outcomes are in the report.
pub(super) async fn download_images(
    State(state): State<AppState>,
    Json(request): Json<DownloadImagesRequest>,
) -> Result<Json<DownloadImagesResponse>, ApiFailure> {
    let report = state
        .images
        .ingest_images(&state.pool, request.product_id, &request.image_urls)
        .await;

    Ok(Json(DownloadImagesResponse {
        success: true,
        report,
    }))
}
