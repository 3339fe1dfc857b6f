//! Ventus CLI - Ventus Card transaction insights
//!
//! Usage:
//!   ventus import --file statement.csv --enrich   Import and classify a statement
//!   ventus report pillars                         Spending by pillar
//!   ventus correct txn_... "Travel & Exploration" Airfare
//!   ventus deals                                  Partner deals for the profile
//!   ventus analytics cross-sell                   Sample portfolio cross-sell matrix

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // Analytics and the pillar list run without a session
    let config_path = cli.config.as_deref();
    let session_path = cli.session.as_deref();
    let open = || commands::open_context(config_path, session_path);

    match cli.command {
        Commands::Pillars { json } => commands::cmd_pillars(json),
        Commands::Analytics { analytics_type } => {
            let config = commands::load_config(config_path)?;
            let decimals = config.reports.percentage_decimals;
            match analytics_type {
                AnalyticsType::CardProducts { selection, json } => {
                    commands::cmd_analytics_card_products(&selection.to_selection(), decimals, json)
                }
                AnalyticsType::AgeRanges { selection, json } => {
                    commands::cmd_analytics_age_ranges(&selection.to_selection(), decimals, json)
                }
                AnalyticsType::CrossSell { selection, json } => {
                    commands::cmd_analytics_cross_sell(&selection.to_selection(), json)
                }
                AnalyticsType::Opportunities {
                    selection,
                    limit,
                    json,
                } => commands::cmd_analytics_opportunities(&selection.to_selection(), limit, json),
            }
        }
        Commands::Import {
            file,
            anchor_zip,
            mapping,
            no_derive_merchants,
            enrich,
            json,
        } => {
            let mut ctx = open()?;
            let raw = commands::read_input(file.as_deref())?;
            let imported = commands::cmd_import(
                &mut ctx,
                &raw,
                anchor_zip,
                &mapping,
                !no_derive_merchants,
                json,
            )?;
            if imported && enrich {
                commands::cmd_enrich(&mut ctx).await?;
            }
            Ok(())
        }
        Commands::Enrich { check } => {
            let mut ctx = open()?;
            if check {
                commands::cmd_enrich_check(&ctx).await
            } else {
                commands::cmd_enrich(&mut ctx).await
            }
        }
        Commands::Correct {
            id,
            pillar,
            subcategory,
            reason,
        } => commands::cmd_correct(&mut open()?, &id, &pillar, &subcategory, reason),
        Commands::Uncorrect { id } => commands::cmd_uncorrect(&mut open()?, &id),
        Commands::Transactions {
            filter,
            limit,
            json,
        } => commands::cmd_transactions(&open()?, &filter.to_filter(), limit, json),
        Commands::Report { report_type } => {
            let ctx = open()?;
            match report_type {
                ReportType::Pillars { filter, json } => {
                    commands::cmd_report_pillars(&ctx, &filter.to_filter(), json)
                }
                ReportType::Merchants {
                    filter,
                    limit,
                    json,
                } => commands::cmd_report_merchants(&ctx, &filter.to_filter(), limit, json),
                ReportType::Subcategories {
                    filter,
                    limit,
                    json,
                } => commands::cmd_report_subcategories(&ctx, &filter.to_filter(), limit, json),
            }
        }
        Commands::Profile { filter, json } => {
            commands::cmd_profile(&open()?, &filter.to_filter(), json)
        }
        Commands::Deals {
            filter,
            limit,
            no_personalize,
            json,
        } => {
            commands::cmd_deals(&open()?, &filter.to_filter(), limit, !no_personalize, json).await
        }
        Commands::Reset { corrections_only } => commands::cmd_reset(&mut open()?, corrections_only),
    }
}
