//! Receipt scoring command

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use guardian_core::{
    parse_extraction_response, ExpenseGuardian, Receipt, ReceiptInput, Recommendation,
};
use sha2::{Digest, Sha256};

use crate::store::{load_history, save_history};

/// Assemble the receipt input from command-line flags or an extractor response
pub fn build_input(
    vendor: Option<String>,
    amount: Option<f64>,
    category: String,
    date: Option<&str>,
    extraction: Option<&Path>,
    image: Option<&Path>,
) -> Result<ReceiptInput> {
    let mut input = match extraction {
        Some(path) => {
            let response = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read extraction file {}", path.display()))?;
            parse_extraction_response(&response)?
        }
        None => ReceiptInput {
            vendor: vendor.ok_or_else(|| anyhow!("--vendor is required"))?,
            amount: amount.ok_or_else(|| anyhow!("--amount is required"))?,
            category,
            date: None,
            image_ref: None,
        },
    };

    if let Some(date) = date {
        input.date = Some(
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .context("Invalid --date format (use YYYY-MM-DD)")?,
        );
    }

    if let Some(image) = image {
        input.image_ref = Some(image_ref(image)?);
    }

    Ok(input)
}

/// Content-addressed reference for a receipt image
pub fn image_ref(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    let image_data = std::fs::read(path).context("Failed to read receipt image")?;
    let mut hasher = Sha256::new();
    hasher.update(&image_data);
    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// Score a receipt, optionally appending it to a history file
pub fn cmd_score(
    guardian: &ExpenseGuardian,
    input: ReceiptInput,
    today: NaiveDate,
    history_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let receipt = match history_path {
        Some(path) => {
            let mut history = load_history(path)?;
            let receipt = guardian.submit(&mut history, input, today)?.clone();
            save_history(path, &history)?;
            receipt
        }
        None => guardian.assess(input, today)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        print_receipt(&receipt);
        if let Some(path) = history_path {
            println!("Saved to {}", path.display());
        }
    }

    Ok(())
}

pub fn recommendation_label(rec: Option<Recommendation>) -> &'static str {
    match rec {
        Some(Recommendation::AutoApprove) => "✅ Auto-Approve",
        Some(Recommendation::ManualReview) => "⚠️  Manual-Review",
        Some(Recommendation::AutoReject) => "❌ Auto-Reject",
        None => "Unscored",
    }
}

fn print_receipt(receipt: &Receipt) {
    println!("\n{}", recommendation_label(receipt.recommendation));
    println!("{}", "─".repeat(50));
    println!("  Vendor:     {}", receipt.vendor);
    println!("  Date:       {}", receipt.date);
    println!("  Category:   {}", receipt.category);
    println!("  Amount:     ${:.2}", receipt.amount);
    println!(
        "  Risk score: {}/100",
        receipt
            .risk_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    if receipt.flags.is_empty() {
        println!("  Flags:      none");
    } else {
        println!("  Flags:");
        for flag in &receipt.flags {
            println!("    • {}", flag);
        }
    }

    if let Some(image) = &receipt.image_ref {
        println!("  Image:      {}", image);
    }
    println!();
}
