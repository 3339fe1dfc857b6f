//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, session context, input, AI client)
//! - `import` - Statement import
//! - `enrich` - Enrichment service calls
//! - `corrections` - Correct / uncorrect transactions
//! - `transactions` - Transaction listing
//! - `reports` - Pillar, merchant and subcategory reports
//! - `profile` - Spending profile
//! - `deals` - Partner deals
//! - `analytics` - Sample portfolio analytics
//! - `session` - Pillar list and session reset

pub mod analytics;
pub mod core;
pub mod corrections;
pub mod deals;
pub mod enrich;
pub mod import;
pub mod profile;
pub mod reports;
pub mod session;
pub mod transactions;

// Re-export command functions for main.rs
pub use analytics::*;
pub use core::*;
pub use corrections::*;
pub use deals::*;
pub use enrich::*;
pub use import::*;
pub use profile::*;
pub use reports::*;
pub use session::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
