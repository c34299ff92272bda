//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Guardian - Score expense receipts and forecast spend
#[derive(Parser)]
#[command(name = "guardian")]
#[command(about = "Expense receipt risk scoring and approval recommendations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Policy file (TOML)
    ///
    /// Defaults to ~/.local/share/expense-guardian/config/policy.toml when it
    /// exists, otherwise the built-in policy is used.
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a receipt and print the recommendation
    Score {
        /// Vendor name
        #[arg(long, required_unless_present = "extraction", conflicts_with = "extraction")]
        vendor: Option<String>,

        /// Receipt total
        #[arg(
            long,
            allow_negative_numbers = true,
            required_unless_present = "extraction",
            conflicts_with = "extraction"
        )]
        amount: Option<f64>,

        /// Expense category (unknown names count as Other)
        #[arg(long, default_value = "Other")]
        category: String,

        /// Receipt date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Raw extractor response (JSON, optionally fenced) to score instead
        #[arg(short, long)]
        extraction: Option<PathBuf>,

        /// Receipt image; its SHA-256 becomes the image reference
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// History file to append the scored receipt to
        #[arg(long)]
        history: Option<PathBuf>,

        /// Print the scored record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the spend report for a history file
    Report {
        /// History file
        #[arg(long, default_value = "guardian-history.json")]
        history: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the receipts in a history file
    History {
        /// History file
        #[arg(long, default_value = "guardian-history.json")]
        history: PathBuf,

        /// Write CSV to stdout instead of a table
        #[arg(long)]
        csv: bool,
    },

    /// Re-score every receipt in a history file under the current policy
    Rescore {
        /// History file
        #[arg(long, default_value = "guardian-history.json")]
        history: PathBuf,

        /// Show changes without rewriting the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective policy
    Policy,
}
