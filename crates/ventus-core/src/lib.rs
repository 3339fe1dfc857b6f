//! Ventus Core Library
//!
//! Transaction layer for the Ventus Card cardholder tool:
//! - Statement import with header detection and column mapping
//! - Merging of AI enrichment results into canonical transactions
//! - User corrections layered over the engine's classifications
//! - Date, confidence and pillar filters over enriched transactions
//! - Grouped spending reports with exact percentages
//! - Sample portfolio analytics (card products, age ranges, cross-sell)
//! - Spending profiles and personalized partner deals
//! - File-backed session state

pub mod ai;
pub mod config;
pub mod deals;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod import;
pub mod models;
pub mod profile;
pub mod reports;
pub mod sample;
pub mod store;

/// Test utilities including a mock enrichment service
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, EnrichmentResult, HttpBackend, MockBackend};
pub use config::{BackendKind, Config, EnrichmentConfig, ImportConfig, ReportsConfig, SessionConfig};
pub use deals::{Deal, PersonalizationOutcome, PersonalizedDeal};
pub use enrich::CorrectionSet;
pub use error::{Error, Result};
pub use filter::{SelectionFilter, TransactionFilter};
pub use import::{
    ColumnMapping, Field, ImportOutcome, MappingSuggestion, NormalizeOptions, NormalizedBatch,
    SkippedRow,
};
pub use models::*;
pub use sample::SampleRecord;
pub use store::SessionStore;
