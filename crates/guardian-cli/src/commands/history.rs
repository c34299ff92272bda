//! History commands (list, CSV export, re-score)

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use guardian_core::{ExpenseGuardian, SessionHistory};

use super::score::recommendation_label;
use super::truncate;
use crate::store::{load_history, save_history};

/// List the receipts in a history file
pub fn cmd_history(history_path: &Path, csv: bool) -> Result<()> {
    let history = load_history(history_path)?;

    if csv {
        return write_history_csv(&history, std::io::stdout());
    }

    if history.is_empty() {
        println!("No expenses have been processed yet.");
        return Ok(());
    }

    println!("\nRecent Processing History ({})", history.len());
    println!("{}", "─".repeat(80));
    for receipt in &history {
        println!(
            "  {}  {:<28} {:<16} ${:>9.2}  {:>3}  {}",
            receipt.date,
            truncate(&receipt.vendor, 28),
            receipt.category.as_str(),
            receipt.amount,
            receipt.risk_score.unwrap_or_default(),
            recommendation_label(receipt.recommendation)
        );
    }
    println!();
    Ok(())
}

/// Write history rows as CSV
pub fn write_history_csv<W: Write>(history: &SessionHistory, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "date",
        "vendor",
        "category",
        "amount",
        "risk_score",
        "recommendation",
        "flags",
        "image_ref",
    ])?;

    for receipt in history {
        wtr.write_record([
            receipt.date.format("%Y-%m-%d").to_string(),
            receipt.vendor.clone(),
            receipt.category.to_string(),
            format!("{:.2}", receipt.amount),
            receipt
                .risk_score
                .map(|s| s.to_string())
                .unwrap_or_default(),
            receipt
                .recommendation
                .map(|r| r.to_string())
                .unwrap_or_default(),
            receipt.flags.join("; "),
            receipt.image_ref.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush().context("Failed to write CSV")?;
    Ok(())
}

/// Re-score every stored receipt under the current policy
///
/// Stored records are not edited; the file is rewritten with new records.
pub fn cmd_rescore(guardian: &ExpenseGuardian, history_path: &Path, dry_run: bool) -> Result<()> {
    let history = load_history(history_path)?;
    if history.is_empty() {
        println!("No expenses have been processed yet.");
        return Ok(());
    }

    let mut rescored = SessionHistory::new();
    let mut changed = 0;

    for receipt in &history {
        let fresh = guardian.rescore(receipt)?;
        if fresh.risk_score != receipt.risk_score || fresh.recommendation != receipt.recommendation
        {
            changed += 1;
            println!(
                "  {:<28} {:>3} → {:>3}  {} → {}",
                truncate(&receipt.vendor, 28),
                receipt.risk_score.unwrap_or_default(),
                fresh.risk_score.unwrap_or_default(),
                recommendation_label(receipt.recommendation),
                recommendation_label(fresh.recommendation)
            );
        }
        rescored.push(fresh)?;
    }

    println!("{} of {} receipts changed", changed, history.len());

    if dry_run {
        println!("Dry run - {} not modified", history_path.display());
    } else if changed > 0 {
        save_history(history_path, &rescored)?;
        println!("Updated {}", history_path.display());
    }

    Ok(())
}
