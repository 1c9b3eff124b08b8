//! Sequential image ingest: download, normalize, upload, persist.
//!
//! Per-image failures are recorded per item and never abort the batch; the
//! report always covers every input URL. The first row stored for a product
//! becomes the featured image inside the insert itself.

use reqwest::Client;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use stockbook_db::{insert_image, NewImage};

use crate::error::ImageError;
use crate::normalize::normalize_to_jpeg;
use crate::storage::StorageClient;

/// Outcome for one input URL.
#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub original_url: String,
    pub image_id: Option<Uuid>,
    pub stored_url: Option<String>,
    pub file_name: Option<String>,
    pub success: bool,
    pub skipped: bool,
    pub error: Option<String>,
}

impl ImageResult {
    fn skipped(url: &str, why: &str) -> Self {
        Self {
            original_url: url.to_string(),
            image_id: None,
            stored_url: None,
            file_name: None,
            success: false,
            skipped: true,
            error: Some(why.to_string()),
        }
    }

    fn failed(url: &str, error: &ImageError) -> Self {
        Self {
            original_url: url.to_string(),
            image_id: None,
            stored_url: None,
            file_name: None,
            success: false,
            skipped: false,
            error: Some(error.to_string()),
        }
    }
}

/// Batch report: one entry per input URL, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub results: Vec<ImageResult>,
    pub success_count: usize,
    pub total_count: usize,
}

impl IngestReport {
    #[must_use]
    pub fn from_results(results: Vec<ImageResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let total_count = results.len();
        Self {
            results,
            success_count,
            total_count,
        }
    }
}

/// URLs that are never worth storing: inline data and vector assets.
#[must_use]
pub fn skip_reason(url: &str) -> Option<&'static str> {
    if url.starts_with("data:") {
        return Some("data: URI");
    }
    let lower = url.to_ascii_lowercase();
    if lower.contains(".svg") || lower.contains("svg+xml") {
        return Some("SVG asset");
    }
    None
}

/// `{product_id}_{timestamp}_{index}_{suffix}.jpg` — collision-resistant
/// within a product, sortable by upload time.
#[must_use]
pub fn build_file_name(product_id: Uuid, timestamp_millis: i64, index: usize, suffix: u32) -> String {
    format!("{product_id}_{timestamp_millis}_{index}_{suffix:06x}.jpg")
}

/// Downloads, normalizes, uploads, and persists image candidates for one
/// product.
pub struct ImagePipeline {
    http: Client,
    storage: StorageClient,
}

impl ImagePipeline {
    /// Creates the pipeline with a browser user-agent; image CDNs routinely
    /// refuse library defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        storage: StorageClient,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, ImageError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http, storage })
    }

    /// Ingests every URL sequentially. Never fails as a whole: the report
    /// accounts for each input as stored, skipped, or failed.
    pub async fn ingest_images(
        &self,
        pool: &PgPool,
        product_id: Uuid,
        urls: &[String],
    ) -> IngestReport {
        let mut results = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            if let Some(why) = skip_reason(url) {
                tracing::debug!(url, why, "image skipped");
                results.push(ImageResult::skipped(url, why));
                continue;
            }

            match self.store_one(pool, product_id, index, url).await {
                Ok((image_id, stored_url, file_name)) => {
                    tracing::info!(url, stored_url, "image stored");
                    results.push(ImageResult {
                        original_url: url.clone(),
                        image_id: Some(image_id),
                        stored_url: Some(stored_url),
                        file_name: Some(file_name),
                        success: true,
                        skipped: false,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "image failed");
                    results.push(ImageResult::failed(url, &e));
                }
            }
        }

        let report = IngestReport::from_results(results);
        tracing::info!(
            %product_id,
            stored = report.success_count,
            total = report.total_count,
            "image batch ingested"
        );
        report
    }

    async fn store_one(
        &self,
        pool: &PgPool,
        product_id: Uuid,
        index: usize,
        url: &str,
    ) -> Result<(Uuid, String, String), ImageError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        if content_type.contains("avif") {
            return Err(ImageError::UnsupportedFormat(content_type));
        }

        let bytes = response.bytes().await?;
        let normalized = normalize_to_jpeg(&bytes)?;

        let file_name = build_file_name(
            product_id,
            chrono::Utc::now().timestamp_millis(),
            index,
            rand::random::<u32>() & 0x00ff_ffff,
        );
        let storage_path = format!("products/{file_name}");

        let stored_url = self
            .storage
            .upload(&storage_path, normalized.bytes, "image/jpeg")
            .await?;

        let row = insert_image(
            pool,
            &NewImage {
                product_id,
                url: stored_url.clone(),
                storage_path,
                file_name: file_name.clone(),
            },
        )
        .await?;

        Ok((row.id, stored_url, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(url: &str) -> ImageResult {
        ImageResult {
            original_url: url.to_string(),
            image_id: Some(Uuid::new_v4()),
            stored_url: Some(format!("https://store.example/{url}")),
            file_name: Some("f.jpg".to_string()),
            success: true,
            skipped: false,
            error: None,
        }
    }

    #[test]
    fn skip_reasons() {
        assert_eq!(skip_reason("data:image/gif;base64,R0lG"), Some("data: URI"));
        assert_eq!(
            skip_reason("https://c.example/assets/art.SVG"),
            Some("SVG asset")
        );
        assert_eq!(
            skip_reason("https://c.example/x?fmt=svg+xml"),
            Some("SVG asset")
        );
        assert_eq!(skip_reason("https://c.example/photo.jpg"), None);
    }

    #[test]
    fn file_name_scheme() {
        let id = Uuid::nil();
        let name = build_file_name(id, 1_724_500_000_123, 3, 0x00ab_cdef);
        assert_eq!(
            name,
            "00000000-0000-0000-0000-000000000000_1724500000123_3_abcdef.jpg"
        );
    }

    #[test]
    fn report_accounts_for_every_input() {
        // 5 inputs: 2 skipped data: URIs, 1 HTTP 404, 2 stored.
        let results = vec![
            ok("a.jpg"),
            ImageResult::skipped("data:image/gif;base64,x", "data: URI"),
            ImageResult::failed(
                "https://c.example/gone.jpg",
                &ImageError::Status { status: 404 },
            ),
            ImageResult::skipped("data:image/png;base64,y", "data: URI"),
            ok("b.jpg"),
        ];
        let report = IngestReport::from_results(results);
        assert_eq!(report.total_count, 5);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.results.iter().filter(|r| r.skipped).count(), 2);
        assert_eq!(
            report
                .results
                .iter()
                .filter(|r| !r.success && !r.skipped)
                .count(),
            1
        );
    }
}
