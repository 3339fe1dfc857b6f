//! Filters over transaction collections and the sample portfolio
//!
//! Filters never mutate their input; they return the subset that passes, in
//! input order.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enrich::reset_corrections;
use crate::models::{AgeRange, CardProduct, DisplayMode, EnrichedTransaction, Region};
use crate::sample::SampleRecord;

/// Builder for transaction view filters
///
/// The default filter passes everything through: no date bounds, threshold
/// zero, miscellaneous spending included, corrected display mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower date bound
    pub start: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub end: Option<NaiveDate>,
    /// Minimum confidence (0-100); transactions without a score always pass
    pub confidence_threshold: f64,
    /// Keep transactions in the catch-all pillar
    pub include_misc: bool,
    /// Which classification layer the pillar and confidence checks read
    pub display_mode: DisplayMode,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            confidence_threshold: 0.0,
            include_misc: true,
            display_mode: DisplayMode::default(),
        }
    }
}

impl TransactionFilter {
    /// Create a new filter builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, date: Option<NaiveDate>) -> Self {
        self.start = date;
        self
    }

    pub fn end(mut self, date: Option<NaiveDate>) -> Self {
        self.end = date;
        self
    }

    /// Set both date bounds at once
    pub fn date_range(mut self, range: Option<(NaiveDate, NaiveDate)>) -> Self {
        self.start = range.map(|(s, _)| s);
        self.end = range.map(|(_, e)| e);
        self
    }

    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn include_misc(mut self, value: bool) -> Self {
        self.include_misc = value;
        self
    }

    pub fn display_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }

    /// Whether a single transaction passes every condition
    pub fn matches(&self, tx: &EnrichedTransaction) -> bool {
        let date = tx.date();
        if self.start.is_some_and(|start| date < start) {
            return false;
        }
        if self.end.is_some_and(|end| date > end) {
            return false;
        }

        let layer = tx.enrichment_for(self.display_mode);
        if let Some(confidence) = layer.confidence() {
            if confidence < self.confidence_threshold {
                return false;
            }
        }

        self.include_misc || !layer.pillar_or_other().is_misc()
    }
}

/// Return the transactions that pass the filter, preserving order
pub fn apply_filters(
    transactions: &[EnrichedTransaction],
    filter: &TransactionFilter,
) -> Vec<EnrichedTransaction> {
    transactions
        .iter()
        .filter(|tx| filter.matches(tx))
        .cloned()
        .collect()
}

/// Project a collection to the layer a display mode shows
///
/// Raw views drop correction overlays; corrected views are returned as-is.
pub fn project(transactions: &[EnrichedTransaction], mode: DisplayMode) -> Vec<EnrichedTransaction> {
    match mode {
        DisplayMode::Raw => reset_corrections(transactions),
        DisplayMode::Corrected => transactions.to_vec(),
    }
}

/// Set-membership selection over the sample portfolio
///
/// An empty set selects every value for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFilter {
    #[serde(default)]
    pub card_products: BTreeSet<CardProduct>,
    #[serde(default)]
    pub regions: BTreeSet<Region>,
    #[serde(default)]
    pub age_ranges: BTreeSet<AgeRange>,
}

impl SelectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card_products(mut self, products: impl IntoIterator<Item = CardProduct>) -> Self {
        self.card_products = products.into_iter().collect();
        self
    }

    pub fn regions(mut self, regions: impl IntoIterator<Item = Region>) -> Self {
        self.regions = regions.into_iter().collect();
        self
    }

    pub fn age_ranges(mut self, ranges: impl IntoIterator<Item = AgeRange>) -> Self {
        self.age_ranges = ranges.into_iter().collect();
        self
    }

    pub fn matches(&self, record: &SampleRecord) -> bool {
        (self.card_products.is_empty() || self.card_products.contains(&record.card_product))
            && (self.regions.is_empty() || self.regions.contains(&record.region))
            && (self.age_ranges.is_empty() || self.age_ranges.contains(&record.age_range))
    }
}
