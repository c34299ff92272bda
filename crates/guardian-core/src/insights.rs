//! Spend aggregation and forecast
//!
//! Rolls a session history up into per-category totals, a flagged-expense
//! count, and a monthly projection. The forecast is a linear heuristic,
//! average daily spend times the forecast horizon, with no seasonality or
//! trend modeling.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Category, Receipt};
use crate::policy::ForecastConfig;
use crate::rules::MAX_SCORE;

/// Spend attributed to one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
    /// Fraction of total spend (0.0-1.0)
    pub share: f64,
}

/// Aggregated view over a receipt history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendReport {
    pub receipt_count: usize,
    pub total_spend: f64,
    pub total_by_category: BTreeMap<Category, f64>,
    /// Records whose recommendation is not Auto-Approve
    pub flagged_count: usize,
    /// Spend held in review or rejected
    pub flagged_amount: f64,
    pub distinct_days: usize,
    pub average_daily_spend: f64,
    pub forecast_days: u32,
    pub forecast_month: f64,
    pub highest_category: Option<Category>,
    /// Largest categories first
    pub top_categories: Vec<CategoryTotal>,
}

impl SpendReport {
    /// Total for one category (zero when it never appeared)
    pub fn category_total(&self, category: Category) -> f64 {
        self.total_by_category.get(&category).copied().unwrap_or(0.0)
    }
}

/// Aggregate with the default forecast settings
pub fn aggregate(history: &[Receipt]) -> Result<SpendReport> {
    aggregate_with(history, &ForecastConfig::default())
}

/// Aggregate a scored history
///
/// Fails on unscored records and on out-of-range scores or amounts. An
/// empty history yields an all-zero report.
pub fn aggregate_with(history: &[Receipt], config: &ForecastConfig) -> Result<SpendReport> {
    let mut total_by_category: BTreeMap<Category, f64> = BTreeMap::new();
    let mut days = HashSet::new();
    let mut total_spend = 0.0;
    let mut flagged_count = 0;
    let mut flagged_amount = 0.0;

    for (idx, receipt) in history.iter().enumerate() {
        let recommendation = match (receipt.risk_score, receipt.recommendation) {
            (Some(score), Some(_)) if score > MAX_SCORE => {
                return Err(Error::InvalidInput(format!(
                    "receipt #{} ({}) has risk score {} outside 0-{}",
                    idx, receipt.vendor, score, MAX_SCORE
                )))
            }
            (Some(_), Some(rec)) => rec,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "receipt #{} ({}) has not been scored",
                    idx, receipt.vendor
                )))
            }
        };
        receipt.validate()?;

        *total_by_category.entry(receipt.category).or_insert(0.0) += receipt.amount;
        total_spend += receipt.amount;
        days.insert(receipt.date);

        if recommendation.is_flagged() {
            flagged_count += 1;
            flagged_amount += receipt.amount;
        }
    }

    // Zero or one day of history: the total is the daily figure
    let average_daily_spend = if days.len() <= 1 {
        total_spend
    } else {
        total_spend / days.len() as f64
    };
    let forecast_month = average_daily_spend * config.days as f64;

    let mut ranked: Vec<CategoryTotal> = total_by_category
        .iter()
        .map(|(category, amount)| CategoryTotal {
            category: *category,
            amount: *amount,
            share: if total_spend > 0.0 {
                amount / total_spend
            } else {
                0.0
            },
        })
        .collect();
    // Stable sort keeps category order for ties
    ranked.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let highest_category = ranked.first().map(|c| c.category);
    ranked.truncate(config.top_categories);

    debug!(
        receipts = history.len(),
        days = days.len(),
        total_spend,
        forecast_month,
        "Aggregated spend history"
    );

    Ok(SpendReport {
        receipt_count: history.len(),
        total_spend,
        total_by_category,
        flagged_count,
        flagged_amount,
        distinct_days: days.len(),
        average_daily_spend,
        forecast_days: config.days,
        forecast_month,
        highest_category,
        top_categories: ranked,
    })
}
