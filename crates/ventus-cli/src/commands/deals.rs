//! Deals command

use anyhow::Result;
use ventus_core::deals::{personalize_deals, select_deals};
use ventus_core::profile::derive_profile;
use ventus_core::TransactionFilter;

use super::{ai_client, print_json, AppContext};

pub async fn cmd_deals(
    ctx: &AppContext,
    filter: &TransactionFilter,
    limit: Option<usize>,
    personalize: bool,
    json: bool,
) -> Result<()> {
    let transactions = ctx.store.view(filter);
    let profile = derive_profile(&transactions);
    let deals = select_deals(&profile, limit.unwrap_or(ctx.config.reports.top_deals));

    let client = if personalize {
        ai_client(&ctx.config)
    } else {
        None
    };
    let outcome = personalize_deals(client.as_ref(), &deals, &profile).await;

    if json {
        return print_json(&outcome);
    }

    println!();
    println!("🎁 Deals for you");
    println!("   ─────────────────────────────────────────────────────────────");
    if let Some(notice) = &outcome.notice {
        println!("   ⚠️  {}", notice);
    }
    for d in &outcome.deals {
        println!();
        println!(
            "   {} {} ({})",
            d.deal.pillar.icon(),
            d.deal.merchant,
            d.deal.reward
        );
        println!("     {}", d.message);
        println!("     → {}", d.cta);
    }
    Ok(())
}
