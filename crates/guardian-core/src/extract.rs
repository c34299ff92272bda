//! Parsing of extraction-step output
//!
//! The extractor is a black box (typically a vision model) that answers with
//! a JSON object, often wrapped in markdown fences or surrounded by prose.
//! Any risk score it volunteers is ignored; scoring belongs to the rule
//! evaluator.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::ReceiptInput;

/// Fields an extractor may return; everything is optional until validated
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default, alias = "merchant")]
    vendor: Option<String>,
    #[serde(default, alias = "total")]
    amount: Option<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    image_ref: Option<String>,
}

/// Parse an extractor response into a receipt input
pub fn parse_extraction_response(response: &str) -> Result<ReceiptInput> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(Error::InvalidInput(format!(
                "No JSON found in extraction response | Raw: {}",
                truncate(response, 200)
            )))
        }
    };

    let raw: RawExtraction = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidInput(format!(
            "Invalid extraction JSON: {} | Raw: {}",
            e,
            truncate(json_str, 200)
        ))
    })?;

    let vendor = raw
        .vendor
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("extraction is missing a vendor".into()))?;

    let amount = match raw.amount {
        Some(value) => parse_amount(&value)?,
        None => return Err(Error::InvalidInput("extraction is missing an amount".into())),
    };

    let date = raw.date.as_deref().and_then(|d| {
        let d = d.trim();
        match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                if !d.is_empty() {
                    warn!(date = d, "Unparseable receipt date, falling back");
                }
                None
            }
        }
    });

    Ok(ReceiptInput {
        vendor: vendor.trim().to_string(),
        amount,
        category: raw.category.unwrap_or_else(|| "Other".to_string()),
        date,
        image_ref: raw.image_ref,
    })
}

/// Accept numbers and numeric strings like "$1,234.50"
fn parse_amount(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::InvalidInput(format!("amount {} is not representable", n))),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| Error::InvalidInput(format!("amount '{}' is not a number", s)))
        }
        other => Err(Error::InvalidInput(format!(
            "amount must be a number, got {}",
            other
        ))),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
