//! Spending profile derivation
//!
//! Reduces a transaction collection into the qualitative profile used to
//! select and personalize deals. Pure and deterministic: the same input
//! always yields the same profile.

use std::collections::HashMap;

use crate::models::{
    EnrichedTransaction, LocationContext, MerchantProfile, Pillar, PillarProfile, SlimProfile,
    SpendingProfile,
};
use crate::reports::group_by;

pub const TOP_PILLARS: usize = 5;
pub const TOP_MERCHANTS: usize = 10;
pub const MAX_TRAVEL_DESTINATIONS: usize = 5;

/// Signal used when no lifestyle rule fires
pub const FALLBACK_SIGNAL: &str = "active spender";

/// Pillar spend strictly above `threshold` yields `signal`
#[derive(Debug, Clone, Copy)]
pub struct LifestyleRule {
    pub pillar: Pillar,
    pub threshold: f64,
    pub signal: &'static str,
}

/// Lifestyle rules, evaluated in order
pub const LIFESTYLE_RULES: &[LifestyleRule] = &[
    LifestyleRule {
        pillar: Pillar::TravelExploration,
        threshold: 2000.0,
        signal: "frequent traveler",
    },
    LifestyleRule {
        pillar: Pillar::SportsActiveLiving,
        threshold: 1000.0,
        signal: "fitness enthusiast",
    },
    LifestyleRule {
        pillar: Pillar::FoodDining,
        threshold: 1500.0,
        signal: "foodie",
    },
    LifestyleRule {
        pillar: Pillar::EntertainmentCulture,
        threshold: 800.0,
        signal: "culture seeker",
    },
    LifestyleRule {
        pillar: Pillar::ShoppingRetail,
        threshold: 1500.0,
        signal: "savvy shopper",
    },
    LifestyleRule {
        pillar: Pillar::HealthWellness,
        threshold: 600.0,
        signal: "wellness focused",
    },
    LifestyleRule {
        pillar: Pillar::HomeLiving,
        threshold: 1200.0,
        signal: "home improver",
    },
    LifestyleRule {
        pillar: Pillar::Transportation,
        threshold: 1000.0,
        signal: "daily commuter",
    },
];

/// Derive a spending profile from a transaction collection
pub fn derive_profile(transactions: &[EnrichedTransaction]) -> SpendingProfile {
    let total_spend: f64 = transactions.iter().map(|t| t.amount()).sum();
    let avg_transaction_size = if transactions.is_empty() {
        0.0
    } else {
        total_spend / transactions.len() as f64
    };

    let pillar_groups = group_by(transactions, |t| t.enrichment.pillar_or_other().label());
    let pillar_totals: HashMap<Pillar, f64> = pillar_groups
        .iter()
        .map(|g| (Pillar::from_label_lossy(&g.key), g.amount))
        .collect();

    let top_pillars = pillar_groups
        .iter()
        .take(TOP_PILLARS)
        .map(|g| {
            let pillar = Pillar::from_label_lossy(&g.key);
            PillarProfile {
                pillar,
                total_spend: g.amount,
                transaction_count: g.transaction_count,
                top_merchant: top_merchant_in(transactions, pillar),
            }
        })
        .collect();

    let top_merchants = group_by(transactions, |t| t.merchant_or_unknown().to_string())
        .into_iter()
        .take(TOP_MERCHANTS)
        .map(|g| MerchantProfile {
            merchant: g.key,
            total_spend: g.amount,
            visits: g.transaction_count,
        })
        .collect();

    SpendingProfile {
        top_pillars,
        top_merchants,
        lifestyle_signals: lifestyle_signals(&pillar_totals),
        location_context: location_context(transactions),
        total_spend,
        avg_transaction_size,
    }
}

/// Highest-spend merchant within one pillar, named the same way as `top_merchants`
fn top_merchant_in(transactions: &[EnrichedTransaction], pillar: Pillar) -> Option<String> {
    let in_pillar: Vec<EnrichedTransaction> = transactions
        .iter()
        .filter(|t| t.enrichment.pillar_or_other() == pillar)
        .cloned()
        .collect();
    group_by(&in_pillar, |t| t.merchant_or_unknown().to_string())
        .into_iter()
        .next()
        .map(|g| g.key)
}

/// Evaluate the lifestyle rule table against pillar totals
pub fn lifestyle_signals(pillar_totals: &HashMap<Pillar, f64>) -> Vec<String> {
    let signals: Vec<String> = LIFESTYLE_RULES
        .iter()
        .filter(|rule| {
            pillar_totals
                .get(&rule.pillar)
                .is_some_and(|spend| *spend > rule.threshold)
        })
        .map(|rule| rule.signal.to_string())
        .collect();

    if signals.is_empty() {
        vec![FALLBACK_SIGNAL.to_string()]
    } else {
        signals
    }
}

fn location_context(transactions: &[EnrichedTransaction]) -> LocationContext {
    let mut travel_destinations: Vec<String> = Vec::new();
    for travel in transactions.iter().filter_map(|t| t.enrichment.travel()) {
        if travel_destinations.len() == MAX_TRAVEL_DESTINATIONS {
            break;
        }
        let Some(destination) = travel.destination.as_deref() else {
            continue;
        };
        if travel.is_travel
            && !destination.eq_ignore_ascii_case("unknown")
            && !travel_destinations.iter().any(|d| d == destination)
        {
            travel_destinations.push(destination.to_string());
        }
    }

    // Kept in first-seen order so ties resolve to the earliest ZIP
    let mut zips: Vec<(&str, usize)> = Vec::new();
    for zip in transactions
        .iter()
        .filter_map(|t| t.transaction.zip_code.as_deref())
    {
        match zips.iter_mut().find(|(z, _)| *z == zip) {
            Some((_, count)) => *count += 1,
            None => zips.push((zip, 1)),
        }
    }
    let mut home_zip: Option<(&str, usize)> = None;
    for (zip, count) in zips {
        if home_zip.map_or(true, |(_, best)| count > best) {
            home_zip = Some((zip, count));
        }
    }

    LocationContext {
        home_zip: home_zip.map(|(zip, _)| zip.to_string()),
        travel_destinations,
    }
}

impl SpendingProfile {
    /// Reduced payload for the personalization service
    pub fn slim(&self) -> SlimProfile {
        SlimProfile {
            top_pillars: self
                .top_pillars
                .iter()
                .map(|p| p.pillar.label().to_string())
                .collect(),
            top_merchants: self
                .top_merchants
                .iter()
                .take(5)
                .map(|m| m.merchant.clone())
                .collect(),
            lifestyle_signals: self.lifestyle_signals.clone(),
            home_zip: self.location_context.home_zip.clone(),
            travel_destinations: self.location_context.travel_destinations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, Enrichment, Transaction, TravelContext};
    use chrono::NaiveDate;

    fn tx(
        id: usize,
        merchant: Option<&str>,
        amount: f64,
        pillar: Option<Pillar>,
        zip: Option<&str>,
    ) -> EnrichedTransaction {
        let transaction = Transaction {
            id: format!("t{}", id),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            description: merchant.unwrap_or("POS PURCHASE").to_uppercase(),
            merchant: merchant.map(String::from),
            amount,
            zip_code: zip.map(String::from),
        };
        let enrichment = match pillar {
            Some(pillar) => Enrichment::Enriched(Classification {
                pillar,
                subcategory: "General".to_string(),
                confidence: Some(90.0),
                travel: TravelContext::default(),
            }),
            None => Enrichment::Unenriched,
        };
        EnrichedTransaction::new(transaction, enrichment)
    }

    fn travel(id: usize, destination: Option<&str>, is_travel: bool) -> EnrichedTransaction {
        let mut t = tx(id, Some("Airline"), 100.0, Some(Pillar::TravelExploration), None);
        t.enrichment = Enrichment::Enriched(Classification {
            pillar: Pillar::TravelExploration,
            subcategory: "Airfare".to_string(),
            confidence: Some(90.0),
            travel: TravelContext {
                is_travel,
                destination: destination.map(String::from),
            },
        });
        t
    }

    #[test]
    fn test_fitness_signal_above_threshold() {
        let txs = vec![
            tx(1, Some("Equinox"), 900.0, Some(Pillar::SportsActiveLiving), None),
            tx(2, Some("REI"), 600.0, Some(Pillar::SportsActiveLiving), None),
        ];
        let profile = derive_profile(&txs);
        assert!(profile
            .lifestyle_signals
            .contains(&"fitness enthusiast".to_string()));
        assert_eq!(profile.top_pillars[0].total_spend, 1500.0);
        assert_eq!(profile.top_pillars[0].top_merchant.as_deref(), Some("Equinox"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let txs = vec![tx(1, Some("Equinox"), 1000.0, Some(Pillar::SportsActiveLiving), None)];
        let profile = derive_profile(&txs);
        assert_eq!(profile.lifestyle_signals, vec![FALLBACK_SIGNAL.to_string()]);
    }

    #[test]
    fn test_signals_follow_rule_order() {
        let txs = vec![
            tx(1, Some("Whole Foods"), 1600.0, Some(Pillar::FoodDining), None),
            tx(2, Some("Delta"), 2500.0, Some(Pillar::TravelExploration), None),
            tx(3, Some("Lyft"), 1001.0, Some(Pillar::Transportation), None),
        ];
        let profile = derive_profile(&txs);
        assert_eq!(
            profile.lifestyle_signals,
            vec!["frequent traveler", "foodie", "daily commuter"]
        );
    }

    #[test]
    fn test_empty_collection() {
        let profile = derive_profile(&[]);
        assert_eq!(profile.total_spend, 0.0);
        assert_eq!(profile.avg_transaction_size, 0.0);
        assert!(profile.top_pillars.is_empty());
        assert!(profile.top_merchants.is_empty());
        assert_eq!(profile.lifestyle_signals, vec![FALLBACK_SIGNAL.to_string()]);
        assert_eq!(profile.location_context, LocationContext::default());
    }

    #[test]
    fn test_top_pillars_limited_and_unenriched_is_other() {
        let pillars = [
            Pillar::FoodDining,
            Pillar::TravelExploration,
            Pillar::SportsActiveLiving,
            Pillar::EntertainmentCulture,
            Pillar::ShoppingRetail,
            Pillar::HealthWellness,
        ];
        let mut txs: Vec<EnrichedTransaction> = pillars
            .iter()
            .enumerate()
            .map(|(i, p)| tx(i, Some("Shop"), 100.0 + i as f64, Some(*p), None))
            .collect();
        txs.push(tx(99, None, 1000.0, None, None));

        let profile = derive_profile(&txs);
        assert_eq!(profile.top_pillars.len(), TOP_PILLARS);
        assert_eq!(profile.top_pillars[0].pillar, Pillar::Other);
        assert_eq!(profile.top_pillars[0].top_merchant.as_deref(), Some("Unknown"));
        assert_eq!(profile.top_merchants[0].merchant, "Unknown");
        assert_eq!(profile.top_pillars[1].pillar, Pillar::HealthWellness);
        assert!((profile.avg_transaction_size - profile.total_spend / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_merchants_fallback_and_stability() {
        let mut txs: Vec<EnrichedTransaction> = (0..12)
            .map(|i| tx(i, Some(&format!("Merchant {}", i)), 10.0, Some(Pillar::ShoppingRetail), None))
            .collect();
        txs.push(tx(50, None, 10.0, None, None));
        txs.push(tx(51, None, 15.0, None, None));

        let first = derive_profile(&txs);
        let second = derive_profile(&txs);
        assert_eq!(first, second);

        assert_eq!(first.top_merchants.len(), TOP_MERCHANTS);
        assert_eq!(first.top_merchants[0].merchant, "Unknown");
        assert_eq!(first.top_merchants[0].visits, 2);
        assert_eq!(first.top_merchants[1].merchant, "Merchant 0");
        assert_eq!(first.top_merchants[9].merchant, "Merchant 8");
    }

    #[test]
    fn test_home_zip_ties_go_to_first_seen() {
        let txs = vec![
            tx(1, None, 1.0, None, Some("30301")),
            tx(2, None, 1.0, None, Some("94110")),
            tx(3, None, 1.0, None, Some("94110")),
            tx(4, None, 1.0, None, Some("30301")),
            tx(5, None, 1.0, None, None),
        ];
        assert_eq!(
            derive_profile(&txs).location_context.home_zip.as_deref(),
            Some("30301")
        );

        let txs = vec![
            tx(1, None, 1.0, None, Some("30301")),
            tx(2, None, 1.0, None, Some("94110")),
            tx(3, None, 1.0, None, Some("94110")),
        ];
        assert_eq!(
            derive_profile(&txs).location_context.home_zip.as_deref(),
            Some("94110")
        );
    }

    #[test]
    fn test_travel_destinations_deduped_and_capped() {
        let txs = vec![
            travel(1, Some("Denver"), true),
            travel(2, Some("unknown"), true),
            travel(3, Some("Lisbon"), false),
            travel(4, Some("Denver"), true),
            travel(5, None, true),
            travel(6, Some("Tokyo"), true),
            travel(7, Some("Austin"), true),
            travel(8, Some("Paris"), true),
            travel(9, Some("Mexico City"), true),
            travel(10, Some("Oslo"), true),
        ];
        let destinations = derive_profile(&txs).location_context.travel_destinations;
        assert_eq!(
            destinations,
            vec!["Denver", "Tokyo", "Austin", "Paris", "Mexico City"]
        );
    }

    #[test]
    fn test_slim_profile() {
        let txs = vec![
            tx(1, Some("Delta"), 2500.0, Some(Pillar::TravelExploration), Some("10001")),
            tx(2, Some("Nobu"), 300.0, Some(Pillar::FoodDining), Some("10001")),
        ];
        let slim = derive_profile(&txs).slim();
        assert_eq!(slim.top_pillars, vec!["Travel & Exploration", "Food & Dining"]);
        assert_eq!(slim.top_merchants, vec!["Delta", "Nobu"]);
        assert_eq!(slim.lifestyle_signals, vec!["frequent traveler"]);
        assert_eq!(slim.home_zip.as_deref(), Some("10001"));
    }
}
