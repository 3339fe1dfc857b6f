//! Correction command implementations

use anyhow::{Context, Result};
use ventus_core::Pillar;

use super::AppContext;

pub fn cmd_correct(
    ctx: &mut AppContext,
    id: &str,
    pillar: &str,
    subcategory: &str,
    reason: Option<String>,
) -> Result<()> {
    let pillar: Pillar = pillar.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let subcategory = subcategory.trim();
    if subcategory.is_empty() {
        anyhow::bail!("Subcategory cannot be empty");
    }

    let correction = ctx
        .store
        .correct(id, pillar, subcategory, reason)
        .with_context(|| format!("Failed to correct {}", id))?;

    let original = match (correction.original_pillar, &correction.original_subcategory) {
        (Some(p), Some(s)) => format!("{} / {}", p, s),
        (Some(p), None) => p.to_string(),
        _ => "unclassified".to_string(),
    };
    println!(
        "✏️  {}: {} → {} / {}",
        correction.transaction_id,
        original,
        correction.corrected_pillar,
        correction.corrected_subcategory
    );
    Ok(())
}

pub fn cmd_uncorrect(ctx: &mut AppContext, id: &str) -> Result<()> {
    match ctx.store.uncorrect(id)? {
        Some(correction) => {
            let restored = correction
                .original_pillar
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unclassified".to_string());
            println!("↩️  {}: restored {}", id, restored);
        }
        None => println!("No correction for {}", id),
    }
    Ok(())
}
