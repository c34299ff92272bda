//! Guardian CLI - Expense receipt risk engine
//!
//! Usage:
//!   guardian score --vendor ACME --amount 1500 --category Travel
//!   guardian score --extraction response.json --history history.json
//!   guardian report --history history.json
//!   guardian policy

mod cli;
mod commands;
mod store;


use anyhow::{Context, Result};
use clap::Parser;
use guardian_core::{ExpenseGuardian, RiskPolicy};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
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

    let (policy, source) =
        RiskPolicy::load(cli.policy.as_deref()).context("Failed to load policy")?;
    tracing::debug!(source = %source, "Policy loaded");

    let guardian = ExpenseGuardian::new(&policy).context("Invalid policy")?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Score {
            vendor,
            amount,
            category,
            date,
            extraction,
            image,
            history,
            json,
        } => {
            let input = commands::build_input(
                vendor,
                amount,
                category,
                date.as_deref(),
                extraction.as_deref(),
                image.as_deref(),
            )?;
            commands::cmd_score(&guardian, input, today, history.as_deref(), json)
        }
        Commands::Report { history, json } => commands::cmd_report(&guardian, &history, json),
        Commands::History { history, csv } => commands::cmd_history(&history, csv),
        Commands::Rescore { history, dry_run } => {
            commands::cmd_rescore(&guardian, &history, dry_run)
        }
        Commands::Policy => commands::cmd_policy(&policy, &source),
    }
}
