//! Transaction listing

use anyhow::Result;
use ventus_core::TransactionFilter;

use super::{print_json, truncate, AppContext};

pub fn cmd_transactions(
    ctx: &AppContext,
    filter: &TransactionFilter,
    limit: usize,
    json: bool,
) -> Result<()> {
    let transactions = ctx.store.view(filter);
    let shown = &transactions[..limit.min(transactions.len())];

    if json {
        return print_json(shown);
    }

    if transactions.is_empty() {
        println!("No transactions match.");
        return Ok(());
    }

    println!();
    println!(
        "{:10} │ {:20} │ {:22} │ {:22} │ {:>4} │ {:>10}",
        "Date", "ID", "Merchant", "Pillar / Subcategory", "Conf", "Amount"
    );
    println!("{}", "─".repeat(104));

    for tx in shown {
        let classification = match tx.enrichment.classification() {
            Some(c) => format!("{} / {}", c.pillar.label(), c.subcategory),
            None => "unclassified".to_string(),
        };
        let marker = if tx.is_corrected() { "*" } else { " " };
        let confidence = tx
            .enrichment
            .confidence()
            .map(|c| format!("{:.0}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:10} │ {:20} │ {:22} │ {:21}{} │ {:>4} │ {:>10.2}",
            tx.date(),
            tx.id(),
            truncate(tx.merchant_or_unknown(), 22),
            truncate(&classification, 21),
            marker,
            confidence,
            tx.amount()
        );
    }

    println!();
    println!(
        "Showing {} of {} transactions ({} mode, * = corrected)",
        shown.len(),
        transactions.len(),
        filter.display_mode
    );
    Ok(())
}
