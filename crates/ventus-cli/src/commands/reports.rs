//! Report command implementations

use anyhow::Result;
use ventus_core::reports::{merchant_report, pillar_report, subcategory_report};
use ventus_core::{GroupedReport, TransactionFilter};

use super::{print_json, truncate, AppContext};

fn print_report(title: &str, report: &GroupedReport) {
    println!();
    println!("📊 {}", title);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.transaction_count == 0 {
        println!("   No spending found.");
        return;
    }

    println!(
        "   Total: ${:.2} across {} transactions",
        report.total, report.transaction_count
    );
    println!();
    println!(
        "   {:28} │ {:>10} │ {:>6} │ {:>5}",
        "Group", "Amount", "%", "Count"
    );
    println!("   ─────────────────────────────┼────────────┼────────┼───────");
    for group in report.rows() {
        println!(
            "   {:28} │ {:>10.2} │ {:>5.1}% │ {:>5}",
            truncate(&group.key, 28),
            group.amount,
            group.percentage,
            group.transaction_count
        );
    }
}

pub fn cmd_report_pillars(ctx: &AppContext, filter: &TransactionFilter, json: bool) -> Result<()> {
    let transactions = ctx.store.view(filter);
    let report = pillar_report(&transactions, ctx.config.reports.percentage_decimals);
    if json {
        return print_json(&report);
    }
    print_report("Spending by Pillar", &report);
    Ok(())
}

pub fn cmd_report_merchants(
    ctx: &AppContext,
    filter: &TransactionFilter,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let transactions = ctx.store.view(filter);
    let limit = limit.unwrap_or(ctx.config.reports.top_merchants);
    let report = merchant_report(&transactions, limit, ctx.config.reports.percentage_decimals);
    if json {
        return print_json(&report);
    }
    print_report(&format!("Top {} Merchants", limit), &report);
    Ok(())
}

pub fn cmd_report_subcategories(
    ctx: &AppContext,
    filter: &TransactionFilter,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let transactions = ctx.store.view(filter);
    let limit = limit.unwrap_or(ctx.config.reports.top_subcategories);
    let report = subcategory_report(&transactions, limit, ctx.config.reports.percentage_decimals);
    if json {
        return print_json(&report);
    }
    print_report(&format!("Top {} Subcategories", limit), &report);
    Ok(())
}
