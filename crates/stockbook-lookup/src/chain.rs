//! The lookup chain: sources tried in priority order until one returns a
//! validated result.
//!
//! Order: Open Food Facts (free) → UPC Database (keyed) → Barcode Lookup
//! (keyed) → model fallback. Keyed sources without a configured key are
//! skipped, not failed. A source error is logged and the chain moves on.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use stockbook_ai::AnthropicClient;
use stockbook_core::EnrichedProductData;

use crate::error::LookupError;
use crate::llm::fetch_llm;
use crate::sources::{fetch_barcodelookup, fetch_openfoodfacts, fetch_upcdatabase, normalize};

const OPENFOODFACTS_BASE: &str = "https://world.openfoodfacts.org";
const UPCDATABASE_BASE: &str = "https://api.upcdatabase.org";
const BARCODELOOKUP_BASE: &str = "https://api.barcodelookup.com";

const SOURCE_TIMEOUT_SECS: u64 = 10;

/// Which source produced a lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Openfoodfacts,
    Upcdatabase,
    Barcodelookup,
    Llm,
}

impl std::fmt::Display for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Openfoodfacts => "openfoodfacts",
            Self::Upcdatabase => "upcdatabase",
            Self::Barcodelookup => "barcodelookup",
            Self::Llm => "llm",
        };
        f.write_str(name)
    }
}

/// A validated lookup hit.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub source: LookupSource,
    pub data: EnrichedProductData,
}

/// Which sources are currently usable, for the status endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceStatus {
    pub openfoodfacts: bool,
    pub upcdatabase: bool,
    pub barcodelookup: bool,
    pub llm: bool,
}

/// The configured chain. Construct once and share.
pub struct LookupChain {
    http: Client,
    upc_database_key: Option<String>,
    barcode_lookup_key: Option<String>,
    ai: Option<AnthropicClient>,
    openfoodfacts_base: String,
    upcdatabase_base: String,
    barcodelookup_base: String,
}

impl LookupChain {
    /// Creates a chain against the production APIs.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        upc_database_key: Option<String>,
        barcode_lookup_key: Option<String>,
        ai: Option<AnthropicClient>,
    ) -> Result<Self, LookupError> {
        Self::with_base_urls(
            upc_database_key,
            barcode_lookup_key,
            ai,
            OPENFOODFACTS_BASE,
            UPCDATABASE_BASE,
            BARCODELOOKUP_BASE,
        )
    }

    /// Creates a chain with custom source base URLs (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_urls(
        upc_database_key: Option<String>,
        barcode_lookup_key: Option<String>,
        ai: Option<AnthropicClient>,
        openfoodfacts_base: &str,
        upcdatabase_base: &str,
        barcodelookup_base: &str,
    ) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(SOURCE_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            upc_database_key,
            barcode_lookup_key,
            ai,
            openfoodfacts_base: openfoodfacts_base.trim_end_matches('/').to_string(),
            upcdatabase_base: upcdatabase_base.trim_end_matches('/').to_string(),
            barcodelookup_base: barcodelookup_base.trim_end_matches('/').to_string(),
        })
    }

    /// Which sources the chain can actually call.
    #[must_use]
    pub fn source_status(&self) -> SourceStatus {
        SourceStatus {
            openfoodfacts: true,
            upcdatabase: self.upc_database_key.is_some(),
            barcodelookup: self.barcode_lookup_key.is_some(),
            llm: self.ai.is_some(),
        }
    }

    /// Runs the chain for one barcode. Returns the first validated hit, or
    /// `None` when every source misses, is skipped, or fails.
    pub async fn lookup(&self, barcode: &str) -> Option<LookupResult> {
        if let Some(data) = self
            .try_source(LookupSource::Openfoodfacts, barcode, async {
                fetch_openfoodfacts(&self.http, &self.openfoodfacts_base, barcode).await
            })
            .await
        {
            return Some(data);
        }

        if let Some(key) = &self.upc_database_key {
            if let Some(data) = self
                .try_source(LookupSource::Upcdatabase, barcode, async {
                    fetch_upcdatabase(&self.http, &self.upcdatabase_base, barcode, key).await
                })
                .await
            {
                return Some(data);
            }
        } else {
            tracing::debug!(barcode, source = "upcdatabase", "no API key, skipped");
        }

        if let Some(key) = &self.barcode_lookup_key {
            if let Some(data) = self
                .try_source(LookupSource::Barcodelookup, barcode, async {
                    fetch_barcodelookup(&self.http, &self.barcodelookup_base, barcode, key).await
                })
                .await
            {
                return Some(data);
            }
        } else {
            tracing::debug!(barcode, source = "barcodelookup", "no API key, skipped");
        }

        if let Some(ai) = &self.ai {
            if let Some(data) = self
                .try_source(LookupSource::Llm, barcode, fetch_llm(ai, barcode))
                .await
            {
                return Some(data);
            }
        } else {
            tracing::debug!(barcode, source = "llm", "no API key, skipped");
        }

        tracing::info!(barcode, "no lookup source produced a valid result");
        None
    }

    async fn try_source<F>(
        &self,
        source: LookupSource,
        barcode: &str,
        fetch: F,
    ) -> Option<LookupResult>
    where
        F: std::future::Future<Output = Result<Option<EnrichedProductData>, LookupError>>,
    {
        match fetch.await {
            Ok(Some(data)) => {
                let data = normalize(data);
                if data.is_valid() {
                    tracing::info!(barcode, %source, name = data.name.as_deref(), "lookup hit");
                    Some(LookupResult { source, data })
                } else {
                    tracing::debug!(barcode, %source, "result failed validation");
                    None
                }
            }
            Ok(None) => {
                tracing::debug!(barcode, %source, "barcode unknown");
                None
            }
            Err(e) => {
                tracing::warn!(barcode, %source, error = %e, "source failed, trying next");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;
