//! Wire types for the enrichment and personalization services
//!
//! These types are backend-agnostic and used across all AI implementations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{SlimProfile, Transaction};

/// One transaction as sent to the enrichment service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRequestItem {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub merchant: Option<String>,
    pub amount: f64,
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    #[serde(default)]
    pub zip_code: Option<String>,
}

impl From<&Transaction> for EnrichmentRequestItem {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            description: tx.description.clone(),
            merchant: tx.merchant.clone(),
            amount: tx.amount,
            date: tx.date.format("%Y-%m-%d").to_string(),
            zip_code: tx.zip_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    pub transactions: Vec<EnrichmentRequestItem>,
}

/// Classification returned for one transaction
///
/// `pillar` stays a string here; unknown labels are mapped to the catch-all
/// bucket during the merge, not rejected at the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub transaction_id: String,
    pub pillar: String,
    pub subcategory: String,
    /// 0-100; out-of-range values are clamped during the merge
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub is_travel: bool,
    /// Destination or "unknown"
    #[serde(default)]
    pub destination: Option<String>,
    /// Normalized merchant name
    #[serde(default)]
    pub merchant: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    #[serde(default)]
    pub results: Vec<EnrichmentResult>,
}

/// Slim deal shape sent for personalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealPayload {
    pub id: String,
    pub merchant: String,
    pub category: String,
    pub reward: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationRequest {
    pub deals: Vec<DealPayload>,
    pub profile: SlimProfile,
}

/// Personalized copy for one deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealMessage {
    pub message: String,
    pub cta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationResponse {
    /// Keyed by deal id
    #[serde(default)]
    pub messages: BTreeMap<String, DealMessage>,
}
