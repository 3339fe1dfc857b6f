//! Clients for the external AI collaborators
//!
//! Two serverless functions sit outside this layer: one classifies
//! transactions into pillars, the other writes personalized deal copy. This
//! module provides a backend-agnostic interface to both.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `HttpBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_env();
//!
//! if let Some(ref client) = ai {
//!     let results = client.enrich_transactions(&batch.transactions).await?;
//!     let enriched = enrich::merge(&batch.transactions, &results);
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `VENTUS_AI_BACKEND`: Backend to use (http, mock). Default: http
//! - `VENTUS_ENRICH_HOST`: Base URL of the functions (required for http)
//! - `VENTUS_API_KEY`: Bearer token (optional)

mod http;
mod mock;
pub mod parsing;
pub mod types;

pub use http::HttpBackend;
pub use mock::MockBackend;
pub use types::*;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::{BackendKind, EnrichmentConfig};
use crate::error::Result;
use crate::models::{SlimProfile, Transaction};

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Classify transactions into pillars, subcategories and travel context
    ///
    /// Results are matched back to transactions by id; a transaction with no
    /// result is left unenriched.
    async fn enrich_transactions(&self, transactions: &[Transaction]) -> Result<Vec<EnrichmentResult>>;

    /// Write personalized copy for deals, keyed by deal id
    async fn personalize_deals(
        &self,
        deals: &[DealPayload],
        profile: &SlimProfile,
    ) -> Result<BTreeMap<String, DealMessage>>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Serverless functions over HTTP
    Http(HttpBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `VENTUS_AI_BACKEND` to determine which backend to use:
    /// - `http` (default): Uses VENTUS_ENRICH_HOST and VENTUS_API_KEY
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("VENTUS_AI_BACKEND").unwrap_or_else(|_| "http".to_string());

        match backend.to_lowercase().as_str() {
            "http" => HttpBackend::from_env().map(AIClient::Http),
            "mock" => Some(AIClient::mock()),
            _ => {
                tracing::warn!(backend = %backend, "Unknown VENTUS_AI_BACKEND, falling back to http");
                HttpBackend::from_env().map(AIClient::Http)
            }
        }
    }

    /// Create an AI client from a resolved config section
    ///
    /// Returns None for the http backend when no host is configured.
    pub fn from_config(config: &EnrichmentConfig) -> Option<Self> {
        match config.backend {
            BackendKind::Http => HttpBackend::from_config(config).map(AIClient::Http),
            BackendKind::Mock => Some(AIClient::mock()),
        }
    }

    /// Create an HTTP backend directly
    pub fn http(host: &str) -> Self {
        AIClient::Http(HttpBackend::new(host))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a mock backend whose calls all fail
    pub fn mock_failing() -> Self {
        AIClient::Mock(MockBackend::failing())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn enrich_transactions(&self, transactions: &[Transaction]) -> Result<Vec<EnrichmentResult>> {
        match self {
            AIClient::Http(b) => b.enrich_transactions(transactions).await,
            AIClient::Mock(b) => b.enrich_transactions(transactions).await,
        }
    }

    async fn personalize_deals(
        &self,
        deals: &[DealPayload],
        profile: &SlimProfile,
    ) -> Result<BTreeMap<String, DealMessage>> {
        match self {
            AIClient::Http(b) => b.personalize_deals(deals, profile).await,
            AIClient::Mock(b) => b.personalize_deals(deals, profile).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Http(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Http(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
