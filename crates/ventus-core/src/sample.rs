//! TePilot sample portfolio
//!
//! The bank-analytics console runs on a fixed, synthetic portfolio rather
//! than live transactions. Records are expanded once from per-product
//! bases, regional shares and age mixes, so every (product, region, age)
//! combination with cardholders is present.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::filter::SelectionFilter;
use crate::models::{AgeRange, CardProduct, Region};

/// One (card product, region, age range) slice of the portfolio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub card_product: CardProduct,
    pub region: Region,
    pub age_range: AgeRange,
    pub cardholders: u64,
    /// Total annual spend for the slice (USD)
    pub annual_spend: f64,
}

/// Portfolio size and average annual spend per cardholder
struct ProductBase {
    cardholders: f64,
    avg_annual_spend: f64,
}

fn product_base(product: CardProduct) -> ProductBase {
    let (cardholders, avg_annual_spend) = match product {
        CardProduct::CashBack => (12_000_000.0, 9_800.0),
        CardProduct::TravelRewards => (6_500_000.0, 18_500.0),
        CardProduct::Premium => (2_800_000.0, 42_000.0),
        CardProduct::Student => (3_200_000.0, 3_400.0),
        CardProduct::Secured => (1_900_000.0, 2_600.0),
        CardProduct::Business => (2_400_000.0, 36_000.0),
    };
    ProductBase {
        cardholders,
        avg_annual_spend,
    }
}

fn region_share(region: Region) -> f64 {
    match region {
        Region::Northeast => 0.22,
        Region::Southeast => 0.24,
        Region::Midwest => 0.19,
        Region::Southwest => 0.14,
        Region::West => 0.21,
    }
}

/// Share of a product's cardholders in each age bracket, in `AgeRange::all()` order
fn age_mix(product: CardProduct) -> [f64; 6] {
    match product {
        CardProduct::CashBack => [0.08, 0.22, 0.24, 0.20, 0.15, 0.11],
        CardProduct::TravelRewards => [0.04, 0.24, 0.28, 0.22, 0.14, 0.08],
        CardProduct::Premium => [0.01, 0.14, 0.28, 0.28, 0.19, 0.10],
        CardProduct::Student => [0.72, 0.26, 0.02, 0.0, 0.0, 0.0],
        CardProduct::Secured => [0.30, 0.28, 0.18, 0.12, 0.08, 0.04],
        CardProduct::Business => [0.02, 0.16, 0.30, 0.28, 0.17, 0.07],
    }
}

/// Spend per cardholder relative to the product average
fn age_spend_multiplier(age: AgeRange) -> f64 {
    match age {
        AgeRange::From18To24 => 0.55,
        AgeRange::From25To34 => 0.9,
        AgeRange::From35To44 => 1.15,
        AgeRange::From45To54 => 1.2,
        AgeRange::From55To64 => 1.0,
        AgeRange::SixtyFivePlus => 0.8,
    }
}

/// Every record in the sample portfolio
pub fn sample_records() -> &'static [SampleRecord] {
    static RECORDS: OnceLock<Vec<SampleRecord>> = OnceLock::new();
    RECORDS.get_or_init(|| {
        let mut records = Vec::new();
        for &card_product in CardProduct::all() {
            let base = product_base(card_product);
            let mix = age_mix(card_product);
            for &region in Region::all() {
                for (&age_range, share) in AgeRange::all().iter().zip(mix) {
                    let cardholders = (base.cardholders * region_share(region) * share).round();
                    if cardholders <= 0.0 {
                        continue;
                    }
                    records.push(SampleRecord {
                        card_product,
                        region,
                        age_range,
                        cardholders: cardholders as u64,
                        annual_spend: cardholders
                            * base.avg_annual_spend
                            * age_spend_multiplier(age_range),
                    });
                }
            }
        }
        records
    })
}

/// Sample records matching a selection
pub fn records(selection: &SelectionFilter) -> Vec<SampleRecord> {
    sample_records()
        .iter()
        .filter(|r| selection.matches(r))
        .copied()
        .collect()
}

/// Likelihood and value of moving a cardholder from one product to another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSellPropensity {
    pub from: CardProduct,
    pub to: CardProduct,
    /// Expected conversion rate (0-1)
    pub conversion_rate: f64,
    /// Annual revenue per converted cardholder (USD)
    pub annual_value: f64,
}

const fn propensity(
    from: CardProduct,
    to: CardProduct,
    conversion_rate: f64,
    annual_value: f64,
) -> CrossSellPropensity {
    CrossSellPropensity {
        from,
        to,
        conversion_rate,
        annual_value,
    }
}

/// Defined cross-sell pairings; any pair not listed has no opportunity
pub const CROSS_SELL_PROPENSITY: &[CrossSellPropensity] = &[
    propensity(CardProduct::CashBack, CardProduct::TravelRewards, 0.12, 1_800.0),
    propensity(CardProduct::CashBack, CardProduct::Premium, 0.04, 3_200.0),
    propensity(CardProduct::CashBack, CardProduct::Business, 0.02, 2_400.0),
    propensity(CardProduct::TravelRewards, CardProduct::Premium, 0.09, 3_500.0),
    propensity(CardProduct::TravelRewards, CardProduct::CashBack, 0.05, 900.0),
    propensity(CardProduct::Premium, CardProduct::Business, 0.10, 4_200.0),
    propensity(CardProduct::Premium, CardProduct::TravelRewards, 0.03, 1_500.0),
    propensity(CardProduct::Student, CardProduct::CashBack, 0.35, 1_100.0),
    propensity(CardProduct::Student, CardProduct::TravelRewards, 0.10, 1_400.0),
    propensity(CardProduct::Secured, CardProduct::CashBack, 0.40, 850.0),
    propensity(CardProduct::Secured, CardProduct::Student, 0.05, 300.0),
    propensity(CardProduct::Business, CardProduct::Premium, 0.08, 4_800.0),
    propensity(CardProduct::Business, CardProduct::TravelRewards, 0.06, 2_200.0),
];

pub fn find_propensity(from: CardProduct, to: CardProduct) -> Option<&'static CrossSellPropensity> {
    CROSS_SELL_PROPENSITY
        .iter()
        .find(|p| p.from == from && p.to == to)
}

/// Annual opportunity for moving `from` cardholders to `to`
///
/// `None` for the diagonal and for pairings with no defined propensity.
pub fn cross_sell_estimate(records: &[SampleRecord], from: CardProduct, to: CardProduct) -> Option<f64> {
    if from == to {
        return None;
    }
    let p = find_propensity(from, to)?;
    let cardholders: u64 = records
        .iter()
        .filter(|r| r.card_product == from)
        .map(|r| r.cardholders)
        .sum();
    Some(cardholders as f64 * p.conversion_rate * p.annual_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_covers_every_product_and_region() {
        let all = sample_records();
        for product in CardProduct::all() {
            assert!(all.iter().any(|r| r.card_product == *product));
        }
        for region in Region::all() {
            assert!(all.iter().any(|r| r.region == *region));
        }
        assert!(all.iter().all(|r| r.cardholders > 0 && r.annual_spend > 0.0));
    }

    #[test]
    fn test_student_cards_have_no_older_cardholders() {
        let selection = SelectionFilter::new()
            .card_products([CardProduct::Student])
            .age_ranges([AgeRange::From45To54, AgeRange::SixtyFivePlus]);
        assert!(records(&selection).is_empty());
    }

    #[test]
    fn test_product_totals_match_bases() {
        let cash_back: u64 = sample_records()
            .iter()
            .filter(|r| r.card_product == CardProduct::CashBack)
            .map(|r| r.cardholders)
            .sum();
        assert!((cash_back as i64 - 12_000_000).abs() < 100);
    }

    #[test]
    fn test_propensity_table_well_formed() {
        for (i, p) in CROSS_SELL_PROPENSITY.iter().enumerate() {
            assert_ne!(p.from, p.to, "diagonal pairing {:?}", p.from);
            assert!(p.conversion_rate > 0.0 && p.conversion_rate <= 1.0);
            assert!(
                CROSS_SELL_PROPENSITY[i + 1..]
                    .iter()
                    .all(|q| (q.from, q.to) != (p.from, p.to)),
                "duplicate pairing {:?} -> {:?}",
                p.from,
                p.to
            );
        }
    }

    #[test]
    fn test_cross_sell_estimate() {
        let all = sample_records();
        assert_eq!(
            cross_sell_estimate(all, CardProduct::Premium, CardProduct::Premium),
            None
        );
        assert_eq!(
            cross_sell_estimate(all, CardProduct::Premium, CardProduct::Secured),
            None
        );

        let selection = SelectionFilter::new().regions([Region::West]);
        let west = records(&selection);
        let west_students: u64 = west
            .iter()
            .filter(|r| r.card_product == CardProduct::Student)
            .map(|r| r.cardholders)
            .sum();
        let estimate = cross_sell_estimate(&west, CardProduct::Student, CardProduct::CashBack).unwrap();
        assert!((estimate - west_students as f64 * 0.35 * 1_100.0).abs() < 1e-6);
    }
}
