//! Report command implementation

use std::path::Path;

use anyhow::Result;
use guardian_core::{ExpenseGuardian, SpendReport};

use crate::store::load_history;

/// Print the spend report for a history file
pub fn cmd_report(guardian: &ExpenseGuardian, history_path: &Path, json: bool) -> Result<()> {
    let history = load_history(history_path)?;
    let report = guardian.report(&history)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.receipt_count == 0 {
        println!("No expenses have been processed yet.");
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &SpendReport) {
    println!("\n📊 Spending Summary ({} receipts)", report.receipt_count);
    println!("{}", "─".repeat(50));
    println!("  Total spend:          ${:.2}", report.total_spend);
    println!(
        "  Flagged:              {} (${:.2})",
        report.flagged_count, report.flagged_amount
    );
    println!("  Days covered:         {}", report.distinct_days);
    println!("  Average daily spend:  ${:.2}", report.average_daily_spend);
    println!(
        "  {}-day forecast:      ${:.2}",
        report.forecast_days, report.forecast_month
    );
    if let Some(highest) = report.highest_category {
        println!("  Highest category:     {}", highest);
    }

    println!("\nBy category:");
    for (category, amount) in &report.total_by_category {
        println!("  {:<18} ${:>10.2}", category.as_str(), amount);
    }

    if !report.top_categories.is_empty() {
        println!("\nTop {}:", report.top_categories.len());
        for (i, item) in report.top_categories.iter().enumerate() {
            println!(
                "  {}. {:<18} ${:>10.2}  {:>5.1}%",
                i + 1,
                item.category.as_str(),
                item.amount,
                item.share * 100.0
            );
        }
    }
    println!();
}
