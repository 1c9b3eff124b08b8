//! Object-storage client (Supabase-style storage REST API).
//!
//! Uploads go to `storage/v1/object/{bucket}/{path}` with a bearer key;
//! public URLs are derived, not returned by the API.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ImageError;

/// Client for the product-image bucket.
///
/// Use [`StorageClient::with_base_url`] to point at a mock server in tests.
pub struct StorageClient {
    client: Client,
    base_url: Url,
    key: String,
    bucket: String,
}

impl StorageClient {
    /// Creates a storage client.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ImageError::InvalidStorageUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        key: &str,
        bucket: &str,
        timeout_secs: u64,
    ) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ImageError::InvalidStorageUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            base_url,
            key: key.to_owned(),
            bucket: bucket.to_owned(),
        })
    }

    /// Uploads `bytes` under `path` in the bucket and returns the public URL.
    ///
    /// # Errors
    ///
    /// - [`ImageError::Storage`] on a non-2xx response from the store.
    /// - [`ImageError::Http`] on transport failure.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ImageError> {
        let url = self
            .base_url
            .join(&format!("storage/v1/object/{}/{path}", self.bucket))
            .map_err(|e| ImageError::InvalidStorageUrl(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageError::Storage {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(path))
    }

    /// Public URL for an object in the bucket.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}storage/v1/object/public/{}/{path}",
            self.base_url, self.bucket
        )
    }
}
