//! Sample portfolio analytics commands

use anyhow::Result;
use ventus_core::reports::{
    age_range_summary, card_product_summary, cross_sell_matrix, revenue_opportunities,
};
use ventus_core::{sample, OpportunityLevel, SelectionFilter};

use super::{print_json, truncate};

/// Format a dollar amount in billions or millions
fn format_large(amount: f64) -> String {
    if amount >= 1e9 {
        format!("${:.2}B", amount / 1e9)
    } else if amount >= 1e6 {
        format!("${:.1}M", amount / 1e6)
    } else {
        format!("${:.0}", amount)
    }
}

pub fn cmd_analytics_card_products(
    selection: &SelectionFilter,
    decimals: u32,
    json: bool,
) -> Result<()> {
    let rows = card_product_summary(&sample::records(selection), decimals);
    if json {
        return print_json(&rows);
    }

    println!();
    println!("💳 Card Products");
    println!(
        "   {:18} │ {:>12} │ {:>10} │ {:>10} │ {:>6}",
        "Product", "Cardholders", "Spend", "Per holder", "%"
    );
    println!("   ───────────────────┼──────────────┼────────────┼────────────┼───────");
    for row in &rows {
        println!(
            "   {:18} │ {:>12} │ {:>10} │ {:>10.0} │ {:>5.1}%",
            row.card_product.label(),
            row.cardholders,
            format_large(row.annual_spend),
            row.avg_spend_per_cardholder,
            row.percentage
        );
    }
    Ok(())
}

pub fn cmd_analytics_age_ranges(
    selection: &SelectionFilter,
    decimals: u32,
    json: bool,
) -> Result<()> {
    let rows = age_range_summary(&sample::records(selection), decimals);
    if json {
        return print_json(&rows);
    }

    println!();
    println!("👥 Age Ranges");
    println!(
        "   {:8} │ {:>12} │ {:>10} │ {:>6}",
        "Age", "Cardholders", "Spend", "%"
    );
    println!("   ─────────┼──────────────┼────────────┼───────");
    for row in &rows {
        println!(
            "   {:8} │ {:>12} │ {:>10} │ {:>5.1}%",
            row.age_range.as_str(),
            row.cardholders,
            format_large(row.annual_spend),
            row.percentage
        );
    }
    Ok(())
}

pub fn cmd_analytics_cross_sell(selection: &SelectionFilter, json: bool) -> Result<()> {
    let matrix = cross_sell_matrix(&sample::records(selection));
    if json {
        return print_json(&matrix);
    }

    println!();
    println!("🔀 Cross-sell Matrix (row = current card, column = target card)");
    print!("   {:14}", "");
    for product in &matrix.products {
        print!(" │ {:>10}", truncate(product.label(), 10));
    }
    println!();
    for row in &matrix.cells {
        let Some(first) = row.first() else { continue };
        print!("   {:14}", truncate(first.from.label(), 14));
        for cell in row {
            let label = match cell.level {
                OpportunityLevel::None => "-".to_string(),
                _ => format!("{} {}", level_marker(cell.level), format_large(cell.annual_opportunity)),
            };
            print!(" │ {:>10}", label);
        }
        println!();
    }
    Ok(())
}

fn level_marker(level: OpportunityLevel) -> &'static str {
    match level {
        OpportunityLevel::High => "●",
        OpportunityLevel::Medium => "◐",
        OpportunityLevel::Low => "○",
        OpportunityLevel::None => " ",
    }
}

pub fn cmd_analytics_opportunities(
    selection: &SelectionFilter,
    limit: usize,
    json: bool,
) -> Result<()> {
    let opportunities = revenue_opportunities(&sample::records(selection), limit);
    if json {
        return print_json(&opportunities);
    }

    println!();
    println!("💰 Top Revenue Opportunities");
    if opportunities.is_empty() {
        println!("   No cross-sell opportunities in this selection.");
        return Ok(());
    }
    for (i, o) in opportunities.iter().enumerate() {
        println!(
            "   {}. {} → {}: {} ({})",
            i + 1,
            o.from.label(),
            o.to.label(),
            format_large(o.annual_opportunity),
            o.level
        );
    }
    Ok(())
}
