//! Spending reports and portfolio analytics
//!
//! Every aggregate is recomputed from its input on each call. Percentages
//! are rounded with the largest-remainder method so the displayed values of
//! a report always add up to exactly 100.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{
    AgeRange, AgeRangeSummary, CardProduct, CardProductSummary, CrossSellCell, CrossSellMatrix,
    EnrichedTransaction, GroupSummary, GroupedReport, OpportunityLevel, RevenueOpportunity,
};
use crate::sample::{cross_sell_estimate, SampleRecord};

/// Label of the synthesized row that collects groups cut by a top-N limit
pub const REMAINDER_LABEL: &str = "Everything else";

/// Label for enriched-less transactions in the subcategory report
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Default number of decimals for displayed percentages
pub const DEFAULT_PERCENT_DECIMALS: u32 = 1;

/// Finest precision percentages are rounded to; larger values are clamped
pub const MAX_PERCENT_DECIMALS: u32 = 6;

/// Sum amounts and counts per key
///
/// Groups are sorted by amount descending; equal amounts keep the order in
/// which their key was first seen.
pub fn group_by<F, K>(transactions: &[EnrichedTransaction], key_fn: F) -> Vec<GroupSummary>
where
    F: Fn(&EnrichedTransaction) -> K,
    K: Into<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupSummary> = Vec::new();

    for tx in transactions {
        let key: String = key_fn(tx).into();
        let idx = match index.get(&key) {
            Some(&idx) => idx,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(GroupSummary {
                    key,
                    amount: 0.0,
                    transaction_count: 0,
                    percentage: 0.0,
                });
                groups.len() - 1
            }
        };
        groups[idx].amount += tx.amount();
        groups[idx].transaction_count += 1;
    }

    // sort_by is stable
    groups.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    groups
}

/// Keep the first `n` groups and fold the rest into a remainder row
///
/// Percentages are computed over the displayed rows, remainder included.
/// `None` keeps every group.
pub fn top_n(
    mut groups: Vec<GroupSummary>,
    n: Option<usize>,
    remainder_label: &str,
    decimals: u32,
) -> GroupedReport {
    let total: f64 = groups.iter().map(|g| g.amount).sum();
    let transaction_count: i64 = groups.iter().map(|g| g.transaction_count).sum();

    let dropped = match n {
        Some(n) if n < groups.len() => groups.split_off(n),
        _ => Vec::new(),
    };
    let mut remainder = if dropped.is_empty() {
        None
    } else {
        Some(GroupSummary {
            key: remainder_label.to_string(),
            amount: dropped.iter().map(|g| g.amount).sum(),
            transaction_count: dropped.iter().map(|g| g.transaction_count).sum(),
            percentage: 0.0,
        })
    };

    let amounts: Vec<f64> = groups
        .iter()
        .chain(remainder.iter())
        .map(|g| g.amount)
        .collect();
    let percentages = percentages_of_total(&amounts, decimals);
    for (group, pct) in groups.iter_mut().chain(remainder.iter_mut()).zip(percentages) {
        group.percentage = pct;
    }

    GroupedReport {
        total,
        transaction_count,
        groups,
        remainder,
    }
}

/// Percentage of total for each amount, rounded to `decimals`
///
/// Uses largest-remainder rounding: values are floored to the display
/// precision, then the leftover units go to the largest fractional parts
/// (earlier entries win ties). The result sums to exactly 100 unless the
/// total is zero, in which case every entry is zero. `decimals` is capped at
/// [`MAX_PERCENT_DECIMALS`].
pub fn percentages_of_total(amounts: &[f64], decimals: u32) -> Vec<f64> {
    let total: f64 = amounts.iter().sum();
    if amounts.is_empty() || total <= 0.0 || !total.is_finite() {
        return vec![0.0; amounts.len()];
    }

    let scale = 10f64.powi(decimals.min(MAX_PERCENT_DECIMALS) as i32);
    let target_units = (100.0 * scale).round() as i64;

    let exact: Vec<f64> = amounts.iter().map(|a| a / total * 100.0 * scale).collect();
    let mut units: Vec<i64> = exact.iter().map(|e| e.floor() as i64).collect();
    let assigned: i64 = units.iter().sum();

    let mut order: Vec<usize> = (0..amounts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa)
    });
    // Flooring loses less than one unit per entry
    let leftover = ((target_units - assigned).max(0) as usize).min(amounts.len());
    for &idx in order.iter().cycle().take(leftover) {
        units[idx] += 1;
    }

    units.into_iter().map(|u| u as f64 / scale).collect()
}

/// Spend by pillar (unenriched transactions count as Other)
pub fn pillar_report(transactions: &[EnrichedTransaction], decimals: u32) -> GroupedReport {
    let groups = group_by(transactions, |tx| tx.enrichment.pillar_or_other().label());
    top_n(groups, None, REMAINDER_LABEL, decimals)
}

/// Top merchants by spend, with the rest folded into a remainder
pub fn merchant_report(
    transactions: &[EnrichedTransaction],
    limit: usize,
    decimals: u32,
) -> GroupedReport {
    let groups = group_by(transactions, |tx| tx.merchant_or_unknown().to_string());
    top_n(groups, Some(limit), REMAINDER_LABEL, decimals)
}

/// Top subcategories by spend, with the rest folded into a remainder
pub fn subcategory_report(
    transactions: &[EnrichedTransaction],
    limit: usize,
    decimals: u32,
) -> GroupedReport {
    let groups = group_by(transactions, |tx| {
        tx.enrichment
            .subcategory()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string()
    });
    top_n(groups, Some(limit), REMAINDER_LABEL, decimals)
}

/// Spend per card product over the selected sample records
///
/// Sorted by annual spend descending; products with no records are omitted.
pub fn card_product_summary(records: &[SampleRecord], decimals: u32) -> Vec<CardProductSummary> {
    let mut rows: Vec<CardProductSummary> = CardProduct::all()
        .iter()
        .filter_map(|&card_product| {
            let matching = records.iter().filter(|r| r.card_product == card_product);
            let (cardholders, annual_spend) = matching
                .fold((0u64, 0.0f64), |(c, s), r| (c + r.cardholders, s + r.annual_spend));
            (cardholders > 0).then(|| CardProductSummary {
                card_product,
                cardholders,
                annual_spend,
                avg_spend_per_cardholder: annual_spend / cardholders as f64,
                percentage: 0.0,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.annual_spend.total_cmp(&a.annual_spend));

    let amounts: Vec<f64> = rows.iter().map(|r| r.annual_spend).collect();
    for (row, pct) in rows.iter_mut().zip(percentages_of_total(&amounts, decimals)) {
        row.percentage = pct;
    }
    rows
}

/// Spend per age bracket over the selected sample records, youngest first
pub fn age_range_summary(records: &[SampleRecord], decimals: u32) -> Vec<AgeRangeSummary> {
    let mut rows: Vec<AgeRangeSummary> = AgeRange::all()
        .iter()
        .filter_map(|&age_range| {
            let (cardholders, annual_spend) = records
                .iter()
                .filter(|r| r.age_range == age_range)
                .fold((0u64, 0.0f64), |(c, s), r| (c + r.cardholders, s + r.annual_spend));
            (cardholders > 0).then_some(AgeRangeSummary {
                age_range,
                cardholders,
                annual_spend,
                percentage: 0.0,
            })
        })
        .collect();

    let amounts: Vec<f64> = rows.iter().map(|r| r.annual_spend).collect();
    for (row, pct) in rows.iter_mut().zip(percentages_of_total(&amounts, decimals)) {
        row.percentage = pct;
    }
    rows
}

/// Square cross-sell matrix over every card product
///
/// Diagonal cells and undefined pairings are `none` with a zero estimate.
pub fn cross_sell_matrix(records: &[SampleRecord]) -> CrossSellMatrix {
    let products = CardProduct::all().to_vec();
    let cells = products
        .iter()
        .map(|&from| {
            products
                .iter()
                .map(|&to| {
                    let estimate = cross_sell_estimate(records, from, to);
                    CrossSellCell {
                        from,
                        to,
                        annual_opportunity: estimate.unwrap_or(0.0),
                        level: if from == to {
                            OpportunityLevel::None
                        } else {
                            OpportunityLevel::classify(estimate)
                        },
                    }
                })
                .collect()
        })
        .collect();

    CrossSellMatrix { products, cells }
}

/// Largest cross-sell opportunities, descending
pub fn revenue_opportunities(records: &[SampleRecord], n: usize) -> Vec<RevenueOpportunity> {
    let mut opportunities: Vec<RevenueOpportunity> = Vec::new();
    for &from in CardProduct::all() {
        for &to in CardProduct::all() {
            if let Some(estimate) = cross_sell_estimate(records, from, to).filter(|e| *e > 0.0) {
                opportunities.push(RevenueOpportunity {
                    from,
                    to,
                    annual_opportunity: estimate,
                    level: OpportunityLevel::classify(Some(estimate)),
                });
            }
        }
    }
    opportunities.sort_by(|a, b| b.annual_opportunity.total_cmp(&a.annual_opportunity));
    debug!(
        "Found {} cross-sell opportunities, keeping {}",
        opportunities.len(),
        n.min(opportunities.len())
    );
    opportunities.truncate(n);
    opportunities
}
