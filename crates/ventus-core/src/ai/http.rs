//! HTTP backend for the serverless enrichment and personalization functions
//!
//! # Configuration
//!
//! Environment variables:
//! - `VENTUS_ENRICH_HOST`: Base URL of the functions (required)
//! - `VENTUS_API_KEY`: Bearer token if the functions require one (optional)
//!
//! Every request carries the configured timeout. A request that exceeds it is
//! abandoned and reported as an error; retries are left to the caller.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EnrichmentConfig;
use crate::error::{Error, Result};
use crate::models::{SlimProfile, Transaction};

use super::parsing::{parse_enrichment_response, parse_personalization_response};
use super::types::{
    DealMessage, DealPayload, EnrichmentRequest, EnrichmentRequestItem, EnrichmentResult,
    PersonalizationRequest,
};
use super::AIBackend;

/// HTTP client for the Ventus functions
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    enrich_path: String,
    personalize_path: String,
    health_path: String,
    batch_size: usize,
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
            Client::new()
        })
}

impl HttpBackend {
    /// Create a backend with default paths, timeout and batch size
    pub fn new(base_url: &str) -> Self {
        Self::with_settings(base_url, &EnrichmentConfig::default())
    }

    /// Create from an enrichment config section
    ///
    /// Returns None when no host is configured.
    pub fn from_config(config: &EnrichmentConfig) -> Option<Self> {
        let host = config.host.as_deref()?;
        Some(Self::with_settings(host, config))
    }

    fn with_settings(base_url: &str, config: &EnrichmentConfig) -> Self {
        Self {
            http_client: build_client(config.timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            enrich_path: config.enrich_path.clone(),
            personalize_path: config.personalize_path.clone(),
            health_path: config.health_path.clone(),
            batch_size: config.batch_size.max(1),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `VENTUS_ENRICH_HOST`
    /// Optional: `VENTUS_API_KEY`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("VENTUS_ENRICH_HOST").ok()?;
        let mut backend = Self::new(&host);
        backend.api_key = std::env::var("VENTUS_API_KEY").ok();
        Some(backend)
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Set the timeout applied to every request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = build_client(timeout);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the response text
    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<String> {
        let mut req_builder = self.http_client.post(self.url(path)).json(body);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!("{} returned {}: {}", path, status, body)));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl AIBackend for HttpBackend {
    async fn enrich_transactions(&self, transactions: &[Transaction]) -> Result<Vec<EnrichmentResult>> {
        let mut results = Vec::with_capacity(transactions.len());

        for (batch_idx, batch) in transactions.chunks(self.batch_size).enumerate() {
            let request = EnrichmentRequest {
                transactions: batch.iter().map(EnrichmentRequestItem::from).collect(),
            };
            let body = self.post_json(&self.enrich_path, &request).await?;
            let batch_results = parse_enrichment_response(&body)?;
            debug!(
                "Enrichment batch {}: {} transactions, {} results",
                batch_idx + 1,
                batch.len(),
                batch_results.len()
            );
            results.extend(batch_results);
        }

        Ok(results)
    }

    async fn personalize_deals(
        &self,
        deals: &[DealPayload],
        profile: &SlimProfile,
    ) -> Result<BTreeMap<String, DealMessage>> {
        let request = PersonalizationRequest {
            deals: deals.to_vec(),
            profile: profile.clone(),
        };
        let body = self.post_json(&self.personalize_path, &request).await?;
        parse_personalization_response(&body)
    }

    async fn health_check(&self) -> bool {
        let mut req_builder = self.http_client.get(self.url(&self.health_path));
        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }
        match req_builder.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health check against {} failed: {}", self.base_url, e);
                false
            }
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
