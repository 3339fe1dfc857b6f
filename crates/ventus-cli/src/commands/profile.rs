//! Spending profile command

use anyhow::Result;
use ventus_core::profile::derive_profile;
use ventus_core::TransactionFilter;

use super::{print_json, AppContext};

pub fn cmd_profile(ctx: &AppContext, filter: &TransactionFilter, json: bool) -> Result<()> {
    let transactions = ctx.store.view(filter);
    let profile = derive_profile(&transactions);

    if json {
        return print_json(&profile);
    }

    println!();
    println!("🧭 Spending Profile");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Total: ${:.2}   Average transaction: ${:.2}",
        profile.total_spend, profile.avg_transaction_size
    );
    println!("   Lifestyle: {}", profile.lifestyle_signals.join(", "));

    if let Some(zip) = &profile.location_context.home_zip {
        println!("   Home ZIP: {}", zip);
    }
    if !profile.location_context.travel_destinations.is_empty() {
        println!(
            "   Travels to: {}",
            profile.location_context.travel_destinations.join(", ")
        );
    }

    if !profile.top_pillars.is_empty() {
        println!();
        println!("   Top pillars:");
        for p in &profile.top_pillars {
            println!(
                "     {} {:24} ${:>10.2}  ({} txns{})",
                p.pillar.icon(),
                p.pillar.label(),
                p.total_spend,
                p.transaction_count,
                p.top_merchant
                    .as_deref()
                    .map(|m| format!(", mostly {}", m))
                    .unwrap_or_default()
            );
        }
    }

    if !profile.top_merchants.is_empty() {
        println!();
        println!("   Top merchants:");
        for m in &profile.top_merchants {
            println!("     {:28} ${:>10.2}  ({} visits)", m.merchant, m.total_spend, m.visits);
        }
    }

    Ok(())
}
