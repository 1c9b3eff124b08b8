use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use stockbook_fetch::{FetchError, ScrapedPage, Section};

use super::{ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    url: String,
}

/// Wire shape of a scraped page: images flatten to their URLs, dimensions
/// stay internal to the pipeline.
#[derive(Debug, Serialize)]
pub(super) struct ScrapeData {
    html: String,
    title: String,
    images: Vec<String>,
    sections: Vec<Section>,
}

impl From<ScrapedPage> for ScrapeData {
    fn from(page: ScrapedPage) -> Self {
        let images = page.image_urls();
        Self {
            html: page.html,
            title: page.title,
            images,
            sections: page.sections,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeResponse {
    success: bool,
    data: ScrapeData,
}

fn map_fetch_error(error: &FetchError) -> ApiFailure {
    let status = match error {
        FetchError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
        FetchError::Status { .. } => StatusCode::BAD_GATEWAY,
        FetchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        FetchError::Http(_) | FetchError::Browser { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ApiFailure::new(status, error.to_string())
}

/// Static scrape: plain GET plus DOM parsing, no JavaScript.
pub(super) async fn scrape_page(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ApiFailure> {
    let page = state
        .static_fetcher
        .fetch(&request.url)
        .await
        .map_err(|e| map_fetch_error(&e))?;
    Ok(Json(ScrapeResponse {
        success: true,
        data: page.into(),
    }))
}

/// Headless scrape: full browser rendering for client-side galleries.
pub(super) async fn scrape_page_advanced(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ApiFailure> {
    let page = state
        .headless_fetcher
        .fetch(&request.url)
        .await
        .map_err(|e| map_fetch_error(&e))?;
    Ok(Json(ScrapeResponse {
        success: true,
        data: page.into(),
    }))
}
