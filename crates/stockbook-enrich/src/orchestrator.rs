//! The enrichment run loop: resolver, fetcher, synthesizer, image pipeline,
//! and classifier sequenced per mode.
//!
//! Every run gets a correlation ID carried in a tracing span. A stage
//! failure halts the mode and surfaces the failing step; nothing here is
//! retried automatically.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use stockbook_ai::{
    classify_images, resolve_product_url, synthesize, AnthropicClient, ClassificationResult,
    SynthesisRequest, SynthesisStyle, Synthesized,
};
use stockbook_core::{EnrichmentMode, FilterType, ImageCategory};
use stockbook_db::{
    get_brand, get_product, list_images_by_product, set_featured, set_image_type, DbError,
    ProductRow,
};
use stockbook_fetch::{HeadlessFetcher, ScrapedPage, StaticFetcher};
use stockbook_images::{ImagePipeline, IngestReport};

use crate::error::EnrichError;
use crate::progress::EnrichmentProgress;
use crate::step::Step;

/// Fields filled by the metadata path when the caller names none.
const DEFAULT_META_FIELDS: &[&str] = &[
    "name",
    "manufacturer",
    "category",
    "short_description",
    "long_description",
];

/// One enrichment invocation.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub product_id: Uuid,
    pub mode: EnrichmentMode,
    pub filter: FilterType,
    /// Field keys for the metadata path; defaults apply when empty.
    pub fields: Vec<String>,
    /// Render the product page in a browser instead of a plain GET.
    pub headless: bool,
    /// Synthesize the long description as rich HTML from the scraped
    /// product page, embedding already-stored images.
    pub full_copy: bool,
}

/// Aggregated result of one run. `progress.step` is `Complete` on success
/// and `Error` (with the failing step preserved) otherwise.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub enrichment_id: Uuid,
    pub progress: EnrichmentProgress,
    pub product_url: Option<String>,
    pub metas: Option<serde_json::Value>,
    pub images: Option<IngestReport>,
}

impl EnrichmentOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.progress.step == Step::Complete
    }
}

/// Index of the classification that should become the featured image: the
/// first confirmed pack shot, else the first pack shot at all.
#[must_use]
pub fn pick_featured(classifications: &[ClassificationResult]) -> Option<usize> {
    classifications
        .iter()
        .position(|c| c.category == ImageCategory::Product && c.matches_product)
        .or_else(|| {
            classifications
                .iter()
                .position(|c| c.category == ImageCategory::Product)
        })
}

/// Sequences the pipeline components for one product at a time.
pub struct Orchestrator {
    pool: PgPool,
    ai: Arc<AnthropicClient>,
    static_fetcher: Arc<StaticFetcher>,
    headless_fetcher: Arc<HeadlessFetcher>,
    images: Arc<ImagePipeline>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        pool: PgPool,
        ai: Arc<AnthropicClient>,
        static_fetcher: Arc<StaticFetcher>,
        headless_fetcher: Arc<HeadlessFetcher>,
        images: Arc<ImagePipeline>,
    ) -> Self {
        Self {
            pool,
            ai,
            static_fetcher,
            headless_fetcher,
            images,
        }
    }

    /// Runs one enrichment. Never returns `Err`: failures land in the
    /// outcome with the failing step and message preserved.
    pub async fn run(&self, request: EnrichmentRequest) -> EnrichmentOutcome {
        let enrichment_id = Uuid::new_v4();
        let span = tracing::info_span!("enrichment", %enrichment_id, mode = %request.mode);
        async {
            let mut outcome = EnrichmentOutcome {
                enrichment_id,
                progress: EnrichmentProgress::new(request.mode),
                product_url: None,
                metas: None,
                images: None,
            };
            if let Err(e) = self.execute(&request, &mut outcome).await {
                outcome.progress.fail(e.to_string());
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: &EnrichmentRequest,
        outcome: &mut EnrichmentOutcome,
    ) -> Result<(), EnrichError> {
        match request.mode {
            EnrichmentMode::Metas => self.run_metas(request, outcome).await?,
            EnrichmentMode::Images => self.run_images(request, outcome).await?,
            EnrichmentMode::All => {
                self.run_metas(request, outcome).await?;
                self.run_images(request, outcome).await?;
            }
        }
        outcome.progress.advance(Step::Complete)?;
        Ok(())
    }

    async fn load_brand_prompt(&self, product: &ProductRow) -> Result<Option<String>, EnrichError> {
        let Some(brand_id) = product.brand_id else {
            return Ok(None);
        };
        match get_brand(&self.pool, brand_id).await {
            Ok(brand) => Ok(brand.ai_prompt),
            // A dangling brand reference degrades to generic guidance.
            Err(DbError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn run_metas(
        &self,
        request: &EnrichmentRequest,
        outcome: &mut EnrichmentOutcome,
    ) -> Result<(), EnrichError> {
        outcome.progress.advance(Step::FetchingMetas)?;

        let product = get_product(&self.pool, request.product_id).await?;
        let brand_prompt = self.load_brand_prompt(&product).await?;
        let fields = if request.fields.is_empty() {
            DEFAULT_META_FIELDS.iter().map(ToString::to_string).collect()
        } else {
            request.fields.clone()
        };

        // Full copy grounds the model in the live product page and the
        // images already stored for the product.
        let (page, stored_urls) = if request.full_copy {
            let url = resolve_product_url(
                &self.ai,
                &product.name,
                product.barcode.as_deref(),
                brand_prompt.as_deref(),
            )
            .await?;
            outcome.product_url = Some(url.clone());
            let page = if request.headless {
                self.headless_fetcher.fetch(&url).await?
            } else {
                self.static_fetcher.fetch(&url).await?
            };
            let stored = list_images_by_product(&self.pool, product.id).await?;
            (Some(page), stored.into_iter().map(|r| r.url).collect())
        } else {
            (None, Vec::new())
        };

        let synthesis = build_meta_synthesis(&product, fields, brand_prompt, page, stored_urls);

        match synthesize(&self.ai, &synthesis).await? {
            Synthesized::Json(value) => {
                outcome.progress.metas_count =
                    Some(value.as_object().map_or(0, serde_json::Map::len));
                outcome.metas = Some(value);
            }
            Synthesized::Html(html) => {
                outcome.progress.metas_count = Some(1);
                outcome.metas = Some(serde_json::json!({ "long_description": html }));
            }
        }
        Ok(())
    }

    async fn run_images(
        &self,
        request: &EnrichmentRequest,
        outcome: &mut EnrichmentOutcome,
    ) -> Result<(), EnrichError> {
        outcome.progress.advance(Step::FindingUrl)?;
        let product = get_product(&self.pool, request.product_id).await?;
        let brand_prompt = self.load_brand_prompt(&product).await?;
        let url = resolve_product_url(
            &self.ai,
            &product.name,
            product.barcode.as_deref(),
            brand_prompt.as_deref(),
        )
        .await?;
        outcome.product_url = Some(url.clone());

        outcome.progress.advance(Step::ScrapingPage)?;
        let page = if request.headless {
            self.headless_fetcher.fetch(&url).await?
        } else {
            self.static_fetcher.fetch(&url).await?
        };

        outcome.progress.advance(Step::DownloadingImages)?;
        let report = self
            .images
            .ingest_images(&self.pool, product.id, &page.image_urls())
            .await;
        outcome.progress.images_count = Some(report.success_count);

        outcome.progress.advance(Step::ClassifyingImages)?;
        let stored: Vec<(Uuid, String)> = report
            .results
            .iter()
            .filter_map(|r| Some((r.image_id?, r.stored_url.clone()?)))
            .collect();
        let urls: Vec<String> = stored.iter().map(|(_, url)| url.clone()).collect();
        let classifications = classify_images(
            &self.ai,
            &urls,
            &product.name,
            product.short_description.as_deref(),
            request.filter,
        )
        .await?;
        for classification in &classifications {
            if let Some((image_id, _)) = stored.get(classification.index) {
                set_image_type(&self.pool, *image_id, classification.category).await?;
            }
        }

        outcome.progress.advance(Step::SettingFeatured)?;
        if let Some(best) = pick_featured(&classifications) {
            if let Some((image_id, _)) = stored.get(best) {
                set_featured(&self.pool, product.id, *image_id).await?;
            }
        }

        outcome.images = Some(report);
        Ok(())
    }
}

/// Builds the synthesis request for the metadata path. A scraped page
/// switches the style to full copy; without one the model works from the
/// catalog fields alone.
fn build_meta_synthesis(
    product: &ProductRow,
    fields: Vec<String>,
    brand_prompt: Option<String>,
    page: Option<ScrapedPage>,
    stored_urls: Vec<String>,
) -> SynthesisRequest {
    let style = if page.is_some() {
        SynthesisStyle::FullCopy
    } else {
        SynthesisStyle::Structured
    };
    let (page_title, page_html) = match page {
        Some(p) => (Some(p.title), Some(p.html)),
        None => (None, None),
    };
    SynthesisRequest {
        product_name: product.name.clone(),
        manufacturer: product.manufacturer.clone(),
        barcode: product.barcode.clone(),
        fields,
        style,
        page_title,
        page_html,
        image_urls: stored_urls,
        brand_prompt,
    }
}
