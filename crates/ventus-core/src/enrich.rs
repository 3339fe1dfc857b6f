//! Enrichment merge and user corrections
//!
//! Two overlays sit on top of canonical transactions: the enrichment
//! engine's classification, then the user's corrections. The engine layer is
//! never discarded; a corrected transaction keeps it in `overridden` so views
//! can read either layer and corrections can be undone.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::EnrichmentResult;
use crate::error::{Error, Result};
use crate::models::{
    Classification, Correction, EnrichedTransaction, Enrichment, Pillar, Transaction,
    TravelContext,
};

/// Overlay enrichment results onto transactions by id
///
/// Transactions without a result stay `Unenriched`. A merchant name from the
/// service only fills a missing merchant; existing fields are never removed.
pub fn merge(transactions: &[Transaction], results: &[EnrichmentResult]) -> Vec<EnrichedTransaction> {
    let by_id: HashMap<&str, &EnrichmentResult> = results
        .iter()
        .map(|r| (r.transaction_id.as_str(), r))
        .collect();

    let mut matched = 0usize;
    let merged: Vec<EnrichedTransaction> = transactions
        .iter()
        .map(|tx| {
            let mut tx = tx.clone();
            let Some(result) = by_id.get(tx.id.as_str()) else {
                return EnrichedTransaction::unenriched(tx);
            };
            matched += 1;

            if tx.merchant.is_none() {
                tx.merchant = result
                    .merchant
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from);
            }

            EnrichedTransaction::new(tx, Enrichment::Enriched(classification_from(result)))
        })
        .collect();

    debug!(
        "Merged enrichment for {}/{} transactions ({} results)",
        matched,
        transactions.len(),
        results.len()
    );
    merged
}

fn classification_from(result: &EnrichmentResult) -> Classification {
    let destination = result
        .destination
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("unknown"))
        .map(String::from);

    Classification {
        pillar: Pillar::from_label_lossy(&result.pillar),
        subcategory: result.subcategory.trim().to_string(),
        confidence: result
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 100.0)),
        travel: TravelContext {
            is_travel: result.is_travel,
            destination,
        },
    }
}

impl Correction {
    /// Build a correction, capturing the engine's values as the originals
    pub fn new(
        tx: &EnrichedTransaction,
        pillar: Pillar,
        subcategory: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        let engine = tx.engine_enrichment();
        Self {
            transaction_id: tx.id().to_string(),
            original_pillar: engine.pillar(),
            corrected_pillar: pillar,
            original_subcategory: engine.subcategory().map(String::from),
            corrected_subcategory: subcategory.into(),
            reason,
            created_at: Utc::now(),
        }
    }
}

/// Active corrections, at most one per transaction id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrectionSet {
    corrections: BTreeMap<String, Correction>,
}

impl CorrectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a correction against a known collection
    ///
    /// Replaces any earlier correction for the same id and returns it. A
    /// correction for an id not in `known` is rejected and nothing changes.
    pub fn record(
        &mut self,
        correction: Correction,
        known: &[EnrichedTransaction],
    ) -> Result<Option<Correction>> {
        if !known.iter().any(|t| t.id() == correction.transaction_id) {
            return Err(Error::NotFound(format!(
                "transaction {}",
                correction.transaction_id
            )));
        }
        debug!(
            transaction_id = %correction.transaction_id,
            pillar = %correction.corrected_pillar,
            "Recording correction"
        );
        Ok(self
            .corrections
            .insert(correction.transaction_id.clone(), correction))
    }

    pub fn remove(&mut self, transaction_id: &str) -> Option<Correction> {
        self.corrections.remove(transaction_id)
    }

    pub fn get(&self, transaction_id: &str) -> Option<&Correction> {
        self.corrections.get(transaction_id)
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn clear(&mut self) {
        self.corrections.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.corrections.values()
    }
}

/// Overlay corrections onto enriched transactions
///
/// Pillar and subcategory come from the correction; confidence and travel
/// context stay as the engine reported them. Applying the same set twice
/// gives the same result as applying it once.
pub fn apply_corrections(
    enriched: &[EnrichedTransaction],
    corrections: &CorrectionSet,
) -> Vec<EnrichedTransaction> {
    enriched
        .iter()
        .map(|tx| {
            let engine = tx.engine_enrichment().clone();
            match corrections.get(tx.id()) {
                Some(correction) => EnrichedTransaction {
                    transaction: tx.transaction.clone(),
                    enrichment: Enrichment::Enriched(Classification {
                        pillar: correction.corrected_pillar,
                        subcategory: correction.corrected_subcategory.clone(),
                        confidence: engine.confidence(),
                        travel: engine.travel().cloned().unwrap_or_default(),
                    }),
                    overridden: Some(engine),
                },
                None => EnrichedTransaction::new(tx.transaction.clone(), engine),
            }
        })
        .collect()
}

/// Drop every correction overlay, restoring the engine layer
pub fn reset_corrections(enriched: &[EnrichedTransaction]) -> Vec<EnrichedTransaction> {
    enriched
        .iter()
        .map(|tx| EnrichedTransaction::new(tx.transaction.clone(), tx.engine_enrichment().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: &str, merchant: Option<&str>, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            description: format!("{} RAW", id.to_uppercase()),
            merchant: merchant.map(String::from),
            amount,
            zip_code: None,
        }
    }

    fn result(id: &str, pillar: &str, subcategory: &str, confidence: Option<f64>) -> EnrichmentResult {
        EnrichmentResult {
            transaction_id: id.to_string(),
            pillar: pillar.to_string(),
            subcategory: subcategory.to_string(),
            confidence,
            is_travel: false,
            destination: None,
            merchant: None,
        }
    }

    #[test]
    fn test_merge_matches_by_id() {
        let txs = vec![tx("a", None, 10.0), tx("b", None, 20.0)];
        let results = vec![result("b", "Food & Dining", "Coffee", Some(91.0))];

        let merged = merge(&txs, &results);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].enrichment, Enrichment::Unenriched);
        assert_eq!(merged[1].enrichment.pillar(), Some(Pillar::FoodDining));
        assert_eq!(merged[1].enrichment.confidence(), Some(91.0));
        assert!(!merged[1].is_corrected());
    }

    #[test]
    fn test_merge_normalizes_service_values() {
        let txs = vec![tx("a", None, 10.0), tx("b", None, 20.0), tx("c", None, 5.0)];
        let mut travel = result("a", "Travel & Exploration", "Airfare", Some(140.0));
        travel.is_travel = true;
        travel.destination = Some("Unknown".to_string());
        let mut odd = result("b", "Crypto", "Exchange", Some(-3.0));
        odd.destination = Some("  ".to_string());
        let nan = result("c", "Transportation", "Rideshare", Some(f64::NAN));

        let merged = merge(&txs, &[travel, odd, nan]);
        let a = merged[0].enrichment.classification().unwrap();
        assert_eq!(a.confidence, Some(100.0));
        assert!(a.travel.is_travel);
        assert_eq!(a.travel.destination, None);

        let b = merged[1].enrichment.classification().unwrap();
        assert_eq!(b.pillar, Pillar::Other);
        assert_eq!(b.confidence, Some(0.0));

        assert_eq!(merged[2].enrichment.confidence(), None);
    }

    #[test]
    fn test_merge_fills_missing_merchant_only() {
        let txs = vec![tx("a", Some("Blue Bottle"), 6.0), tx("b", None, 12.0)];
        let mut ra = result("a", "Food & Dining", "Coffee", None);
        ra.merchant = Some("Blue Bottle Coffee Co".to_string());
        let mut rb = result("b", "Food & Dining", "Fast Casual", None);
        rb.merchant = Some("Chipotle".to_string());

        let merged = merge(&txs, &[ra, rb]);
        assert_eq!(merged[0].transaction.merchant.as_deref(), Some("Blue Bottle"));
        assert_eq!(merged[1].transaction.merchant.as_deref(), Some("Chipotle"));
    }

    #[test]
    fn test_correction_overrides_enrichment() {
        let merged = merge(
            &[tx("t1", Some("Delta"), 420.0)],
            &[result("t1", "Food & Dining", "Restaurants", Some(62.0))],
        );

        let mut set = CorrectionSet::new();
        let correction = Correction::new(
            &merged[0],
            Pillar::TravelExploration,
            "Airfare",
            Some("It was a flight".to_string()),
        );
        assert_eq!(correction.original_pillar, Some(Pillar::FoodDining));
        assert_eq!(correction.original_subcategory.as_deref(), Some("Restaurants"));
        set.record(correction, &merged).unwrap();

        let corrected = apply_corrections(&merged, &set);
        let view = &corrected[0];
        assert_eq!(view.enrichment.pillar(), Some(Pillar::TravelExploration));
        assert_eq!(view.enrichment.subcategory(), Some("Airfare"));
        assert_eq!(view.enrichment.confidence(), Some(62.0));
        assert_eq!(view.engine_enrichment().pillar(), Some(Pillar::FoodDining));
        assert!(view.is_corrected());
    }

    #[test]
    fn test_apply_corrections_idempotent() {
        let merged = merge(
            &[tx("a", None, 1.0), tx("b", None, 2.0)],
            &[
                result("a", "Shopping & Retail", "Clothing", Some(80.0)),
                result("b", "Home & Living", "Furniture", Some(70.0)),
            ],
        );
        let mut set = CorrectionSet::new();
        set.record(
            Correction::new(&merged[1], Pillar::ShoppingRetail, "Decor", None),
            &merged,
        )
        .unwrap();

        let once = apply_corrections(&merged, &set);
        let twice = apply_corrections(&once, &set);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_correction_for_unknown_id_rejected() {
        let merged = merge(&[tx("a", None, 1.0)], &[]);
        let other = EnrichedTransaction::unenriched(tx("zzz", None, 1.0));

        let mut set = CorrectionSet::new();
        let err = set
            .record(Correction::new(&other, Pillar::Other, "Misc", None), &merged)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_later_correction_replaces_earlier() {
        let merged = merge(&[tx("a", None, 1.0)], &[]);
        let mut set = CorrectionSet::new();
        set.record(
            Correction::new(&merged[0], Pillar::FoodDining, "Coffee", None),
            &merged,
        )
        .unwrap();
        let previous = set
            .record(
                Correction::new(&merged[0], Pillar::HealthWellness, "Gym", None),
                &merged,
            )
            .unwrap();

        assert_eq!(previous.map(|c| c.corrected_pillar), Some(Pillar::FoodDining));
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("a").map(|c| c.corrected_pillar),
            Some(Pillar::HealthWellness)
        );

        // Correcting an unenriched transaction creates a classification
        let view = apply_corrections(&merged, &set);
        assert_eq!(view[0].enrichment.pillar(), Some(Pillar::HealthWellness));
        assert_eq!(view[0].enrichment.confidence(), None);
        assert_eq!(view[0].overridden, Some(Enrichment::Unenriched));
    }

    #[test]
    fn test_removed_correction_and_reset_restore_engine_layer() {
        let merged = merge(
            &[tx("a", None, 1.0)],
            &[result("a", "Transportation", "Transit", Some(75.0))],
        );
        let mut set = CorrectionSet::new();
        set.record(
            Correction::new(&merged[0], Pillar::TravelExploration, "Trains", None),
            &merged,
        )
        .unwrap();
        let corrected = apply_corrections(&merged, &set);

        assert_eq!(reset_corrections(&corrected), merged);

        set.remove("a");
        assert_eq!(apply_corrections(&corrected, &set), merged);
    }
}
