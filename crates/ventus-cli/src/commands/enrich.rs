//! Enrichment command implementations

use anyhow::Result;
use tracing::warn;
use ventus_core::ai::AIBackend;
use ventus_core::enrich::merge;

use super::{ai_client, AppContext};

/// Classify the session's transactions
///
/// A service failure is reported and leaves the session as it was.
pub async fn cmd_enrich(ctx: &mut AppContext) -> Result<()> {
    if ctx.store.is_empty() {
        println!("No transactions in the session. Run `ventus import` first.");
        return Ok(());
    }

    let Some(client) = ai_client(&ctx.config) else {
        println!("💡 Tip: Set VENTUS_ENRICH_HOST (or VENTUS_AI_BACKEND=mock) to enable enrichment");
        return Ok(());
    };

    let transactions = ctx.store.transactions();
    println!(
        "🤖 Enriching {} transactions via {}...",
        transactions.len(),
        client.host()
    );

    let results = match client.enrich_transactions(&transactions).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Enrichment failed: {}", e);
            println!("   ⚠️  Enrichment unavailable: {}", e);
            println!("   Session left unchanged.");
            return Ok(());
        }
    };

    let enriched = merge(&transactions, &results);
    let classified = enriched
        .iter()
        .filter(|t| t.enrichment.classification().is_some())
        .count();
    let low_confidence = enriched
        .iter()
        .filter(|t| t.enrichment.confidence().is_some_and(|c| c < 50.0))
        .count();
    ctx.store.set_enriched(enriched)?;

    println!("✅ Classified {}/{} transactions", classified, transactions.len());
    if classified < transactions.len() {
        println!(
            "   {} transactions had no result and stay unclassified",
            transactions.len() - classified
        );
    }
    if low_confidence > 0 {
        println!(
            "   {} low-confidence classifications (review with `ventus transactions`)",
            low_confidence
        );
    }
    if !ctx.store.corrections().is_empty() {
        println!(
            "   {} corrections still apply on top",
            ctx.store.corrections().len()
        );
    }

    Ok(())
}

/// Check that the enrichment service is reachable
pub async fn cmd_enrich_check(ctx: &AppContext) -> Result<()> {
    let Some(client) = ai_client(&ctx.config) else {
        println!("❌ No enrichment backend configured (set VENTUS_ENRICH_HOST)");
        return Ok(());
    };

    if client.health_check().await {
        println!("✅ Enrichment service at {} is available", client.host());
    } else {
        println!("❌ Enrichment service at {} is not responding", client.host());
    }
    Ok(())
}
