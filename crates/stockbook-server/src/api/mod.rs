mod ai_fill;
mod classify;
mod enrich;
mod identify;
mod images;
mod scrape;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use stockbook_ai::AnthropicClient;
use stockbook_enrich::Orchestrator;
use stockbook_fetch::{HeadlessFetcher, StaticFetcher};
use stockbook_images::ImagePipeline;
use stockbook_lookup::LookupChain;

use crate::middleware::request_id;

/// Model calls regularly take a minute on long synthesis prompts.
pub(crate) const AI_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<stockbook_core::AppConfig>,
    pub pool: PgPool,
    pub ai: Option<Arc<AnthropicClient>>,
    pub static_fetcher: Arc<StaticFetcher>,
    pub headless_fetcher: Arc<HeadlessFetcher>,
    pub images: Arc<ImagePipeline>,
    pub lookup: Arc<LookupChain>,
    pub orchestrator: Option<Arc<Orchestrator>>,
}

/// Failure body: `success: false` plus a human-readable message and, where
/// useful, a structured `debug_info` object naming the failing step.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<serde_json::Value>,
}

impl ApiFailure {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error: error.into(),
            debug_info: None,
        }
    }

    pub fn ai_not_configured() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "AI enrichment is not configured (missing API key)",
        )
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(&self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthData {
    success: bool,
    status: &'static str,
    database: &'static str,
    sources: stockbook_lookup::SourceStatus,
}

async fn health(State(state): State<AppState>) -> Json<HealthData> {
    let database = match stockbook_db::ping(&state.pool).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "health check database ping failed");
            "unreachable"
        }
    };
    Json(HealthData {
        success: true,
        status: "ok",
        database,
        sources: state.lookup.source_status(),
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/enrich/by-barcode", post(enrich::enrich_by_barcode))
        .route("/enrich/by-image", post(identify::enrich_by_image))
        .route("/ai-fill", post(ai_fill::ai_fill))
        .route("/classify-images", post(classify::classify_images))
        .route("/scrape-page", post(scrape::scrape_page))
        .route("/scrape-page-advanced", post(scrape::scrape_page_advanced))
        .route("/download-images", post(images::download_images))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}
