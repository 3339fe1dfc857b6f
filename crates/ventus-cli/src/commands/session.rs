//! Pillar list and session reset

use anyhow::Result;
use serde_json::json;
use ventus_core::Pillar;

use super::{print_json, AppContext};

pub fn cmd_pillars(json: bool) -> Result<()> {
    if json {
        let pillars: Vec<_> = Pillar::all()
            .iter()
            .map(|p| {
                json!({
                    "label": p.label(),
                    "slug": p.as_str(),
                    "icon": p.icon(),
                    "color": p.color(),
                })
            })
            .collect();
        return print_json(&pillars);
    }

    println!();
    for p in Pillar::all() {
        println!("   {} {:24} {:22} {}", p.icon(), p.label(), p.as_str(), p.color());
    }
    Ok(())
}

pub fn cmd_reset(ctx: &mut AppContext, corrections_only: bool) -> Result<()> {
    if corrections_only {
        let removed = ctx.store.clear_corrections()?;
        println!("🗑️  Removed {} corrections", removed);
    } else {
        ctx.store.reset()?;
        println!("🗑️  Session cleared ({})", ctx.store.path().display());
    }
    Ok(())
}
