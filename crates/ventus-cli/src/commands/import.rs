//! Import command implementation

use anyhow::{Context, Result};
use ventus_core::import::{
    normalize_text, parse_zip, ColumnMapping, Field, ImportOutcome, NormalizeOptions,
};

use super::{print_json, AppContext};
use crate::cli::MappingArgs;

/// Manual mapping from `--map-*` flags, or None when no flag was given
pub fn mapping_from_args(args: &MappingArgs) -> Option<ColumnMapping> {
    let pairs = [
        (Field::Date, &args.map_date),
        (Field::Description, &args.map_description),
        (Field::Amount, &args.map_amount),
        (Field::Merchant, &args.map_merchant),
        (Field::ZipCode, &args.map_zip),
    ];
    if pairs.iter().all(|(_, header)| header.is_none()) {
        return None;
    }

    let mut mapping = ColumnMapping::default();
    for (field, header) in pairs {
        mapping.set(field, header.clone());
    }
    Some(mapping)
}

/// Import a statement into the session
///
/// Returns whether a batch was loaded; `false` means the headers need a
/// manual mapping and the session was left alone.
pub fn cmd_import(
    ctx: &mut AppContext,
    raw: &str,
    anchor_zip: Option<String>,
    mapping: &MappingArgs,
    derive_merchants: bool,
    json: bool,
) -> Result<bool> {
    let anchor_zip = anchor_zip
        .or_else(|| ctx.config.import.anchor_zip.clone())
        .or_else(|| ctx.store.anchor_zip().map(String::from))
        .map(|zip| {
            parse_zip(&zip).with_context(|| {
                format!("Invalid anchor ZIP \"{}\" (expected 12345 or 12345-6789)", zip)
            })
        })
        .transpose()?;

    let options = NormalizeOptions {
        mapping: mapping_from_args(mapping),
        anchor_zip: anchor_zip.clone(),
        derive_merchants: derive_merchants && ctx.config.import.derive_merchants,
    };

    let outcome = normalize_text(raw, &options).context("Failed to parse statement")?;

    if json {
        print_json(&outcome)?;
    }

    let batch = match outcome {
        ImportOutcome::Ready(batch) => batch,
        ImportOutcome::NeedsMapping {
            headers,
            suggestion,
        } => {
            if !json {
                println!("⚠️  Could not detect all required columns.");
                println!("   Headers: {}", headers.join(", "));
                for field in [Field::Date, Field::Description, Field::Amount] {
                    let detected = suggestion.mapping.get(field).unwrap_or("-");
                    println!("   {:12} → {}", field.as_str(), detected);
                }
                let missing: Vec<String> =
                    suggestion.missing.iter().map(|f| f.to_string()).collect();
                println!("   Missing: {}", missing.join(", "));
                println!();
                println!("   Re-run with --map-date, --map-description and --map-amount.");
            }
            return Ok(false);
        }
    };

    if anchor_zip.as_deref() != ctx.store.anchor_zip() {
        ctx.store.set_anchor_zip(anchor_zip)?;
    }

    let loaded = batch.transactions.len();
    let skipped = batch.skipped.clone();
    ctx.store.load_batch(batch)?;

    if !json {
        println!("📥 Imported {} transactions", loaded);
        if !skipped.is_empty() {
            println!("   ⚠️  Skipped {} rows:", skipped.len());
            for row in &skipped {
                println!("      line {}: {}", row.line, row.reason);
            }
        }
        println!("   Session: {}", ctx.store.path().display());
        println!();
        println!("Next: ventus enrich");
    }

    Ok(true)
}
