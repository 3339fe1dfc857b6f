//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ventus_core::{
    AgeRange, CardProduct, DisplayMode, Region, SelectionFilter, TransactionFilter,
};

/// Ventus - Understand where cardholder spending goes
#[derive(Parser)]
#[command(name = "ventus")]
#[command(about = "Ventus Card transaction enrichment and spending insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Session file (defaults to the configured session path)
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a statement, replacing the current session
    Import {
        /// Statement file (reads stdin when omitted or "-")
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// ZIP code for rows without one
        #[arg(long)]
        anchor_zip: Option<String>,

        #[command(flatten)]
        mapping: MappingArgs,

        /// Do not derive merchant names from descriptions
        #[arg(long)]
        no_derive_merchants: bool,

        /// Enrich the batch right after importing it
        #[arg(long)]
        enrich: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify the session's transactions with the enrichment service
    Enrich {
        /// Only check that the service is reachable
        #[arg(long)]
        check: bool,
    },

    /// Correct the pillar and subcategory of a transaction
    Correct {
        /// Transaction id (txn_...)
        id: String,

        /// Pillar label or slug (see `ventus pillars`)
        pillar: String,

        /// Subcategory
        subcategory: String,

        /// Why the classification was wrong
        #[arg(long)]
        reason: Option<String>,
    },

    /// Remove the correction for a transaction
    Uncorrect {
        /// Transaction id (txn_...)
        id: String,
    },

    /// List transactions in the session
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum rows to show
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate spending reports
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Show the spending profile derived from the session
    Profile {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show partner deals matched to the spending profile
    Deals {
        #[command(flatten)]
        filter: FilterArgs,

        /// Number of deals (defaults to the configured count)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Use catalog copy without calling the personalization service
        #[arg(long)]
        no_personalize: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Portfolio analytics over the TePilot sample dataset
    Analytics {
        #[command(subcommand)]
        analytics_type: AnalyticsType,
    },

    /// List spending pillars
    Pillars {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the session
    Reset {
        /// Only remove corrections, keeping the imported transactions
        #[arg(long)]
        corrections_only: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Spending by pillar
    Pillars {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Top merchants by spend
    Merchants {
        #[command(flatten)]
        filter: FilterArgs,

        /// Number of merchants before folding the rest
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Top subcategories by spend
    Subcategories {
        #[command(flatten)]
        filter: FilterArgs,

        /// Number of subcategories before folding the rest
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AnalyticsType {
    /// Spend and cardholders per card product
    CardProducts {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spend and cardholders per age bracket
    AgeRanges {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cross-sell opportunity matrix
    CrossSell {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Largest cross-sell revenue opportunities
    Opportunities {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Number of opportunities to show
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Manual column mapping, by header name
#[derive(Args, Debug, Clone, Default)]
pub struct MappingArgs {
    /// Header of the date column
    #[arg(long)]
    pub map_date: Option<String>,

    /// Header of the description column
    #[arg(long)]
    pub map_description: Option<String>,

    /// Header of the amount column
    #[arg(long)]
    pub map_amount: Option<String>,

    /// Header of the merchant column
    #[arg(long)]
    pub map_merchant: Option<String>,

    /// Header of the ZIP code column
    #[arg(long)]
    pub map_zip: Option<String>,
}

/// Transaction filter options shared by listing and report commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Drop transactions scored below this confidence (0-100)
    #[arg(long, default_value = "0")]
    pub min_confidence: f64,

    /// Exclude the Other pillar
    #[arg(long)]
    pub exclude_misc: bool,

    /// Classification layer: raw or corrected
    #[arg(long, default_value = "corrected")]
    pub mode: DisplayMode,
}

impl FilterArgs {
    pub fn to_filter(&self) -> TransactionFilter {
        TransactionFilter::new()
            .start(self.from)
            .end(self.to)
            .confidence_threshold(self.min_confidence)
            .include_misc(!self.exclude_misc)
            .display_mode(self.mode)
    }
}

/// Sample portfolio selection; an omitted dimension selects everything
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Card products (cash_back, travel_rewards, premium, student, secured, business)
    #[arg(long = "card-product", value_delimiter = ',')]
    pub card_products: Vec<CardProduct>,

    /// Regions (northeast, southeast, midwest, southwest, west)
    #[arg(long = "region", value_delimiter = ',')]
    pub regions: Vec<Region>,

    /// Age ranges (18-24, 25-34, 35-44, 45-54, 55-64, 65+)
    #[arg(long = "age-range", value_delimiter = ',')]
    pub age_ranges: Vec<AgeRange>,
}

impl SelectionArgs {
    pub fn to_selection(&self) -> SelectionFilter {
        SelectionFilter::new()
            .card_products(self.card_products.iter().copied())
            .regions(self.regions.iter().copied())
            .age_ranges(self.age_ranges.iter().copied())
    }
}
