//! Scoring pipeline and session history
//!
//! [`ExpenseGuardian`] runs the evaluator and the classifier back to back and
//! hands out new, fully scored records. It holds no mutable state, so one
//! instance can serve any number of sessions. Each session owns its own
//! [`SessionHistory`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::insights::{aggregate_with, SpendReport};
use crate::models::{Receipt, ReceiptInput};
use crate::policy::{ForecastConfig, RiskPolicy};
use crate::rules::{RiskEvaluator, BASELINE_SCORE, MAX_SCORE};

/// Append-only list of scored receipts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Receipt>", into = "Vec<Receipt>")]
pub struct SessionHistory {
    records: Vec<Receipt>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from stored records, all of which must be scored
    pub fn from_records(records: Vec<Receipt>) -> Result<Self> {
        let mut history = Self::new();
        for record in records {
            history.push(record)?;
        }
        Ok(history)
    }

    /// Append a scored record
    ///
    /// The record must be valid, carry a score within 0-100, and have flags
    /// exactly when its score is above baseline.
    pub fn push(&mut self, receipt: Receipt) -> Result<&Receipt> {
        let score = match (receipt.risk_score, receipt.recommendation) {
            (Some(score), Some(_)) => score,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "cannot append unscored receipt from {}",
                    receipt.vendor
                )))
            }
        };
        receipt.validate()?;

        if score > MAX_SCORE {
            return Err(Error::InvalidInput(format!(
                "receipt from {} has risk score {} outside 0-{}",
                receipt.vendor, score, MAX_SCORE
            )));
        }
        if receipt.flags.is_empty() != (score == BASELINE_SCORE) {
            return Err(Error::InvalidInput(format!(
                "receipt from {} has score {} but {} flags",
                receipt.vendor, score, receipt.flags.len()
            )));
        }

        self.records.push(receipt);
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn records(&self) -> &[Receipt] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Receipt> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&Receipt> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Receipt> {
        self.records
    }
}

impl TryFrom<Vec<Receipt>> for SessionHistory {
    type Error = Error;

    fn try_from(records: Vec<Receipt>) -> Result<Self> {
        Self::from_records(records)
    }
}

impl From<SessionHistory> for Vec<Receipt> {
    fn from(history: SessionHistory) -> Self {
        history.records
    }
}

impl<'a> IntoIterator for &'a SessionHistory {
    type Item = &'a Receipt;
    type IntoIter = std::slice::Iter<'a, Receipt>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Scores receipts and reports on histories under one policy
#[derive(Debug, Clone)]
pub struct ExpenseGuardian {
    evaluator: RiskEvaluator,
    classifier: Classifier,
    forecast: ForecastConfig,
}

impl ExpenseGuardian {
    pub fn new(policy: &RiskPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            evaluator: RiskEvaluator::from_policy(policy)?,
            classifier: Classifier::new(policy.thresholds)?,
            forecast: policy.forecast,
        })
    }

    pub fn evaluator(&self) -> &RiskEvaluator {
        &self.evaluator
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Validate extraction output and score it
    pub fn assess(&self, input: ReceiptInput, fallback_date: NaiveDate) -> Result<Receipt> {
        let receipt = Receipt::from_input(input, fallback_date)?;
        self.rescore(&receipt)
    }

    /// Score a record's extracted fields, producing a new record
    ///
    /// Any score already on `receipt` is ignored and left untouched.
    pub fn rescore(&self, receipt: &Receipt) -> Result<Receipt> {
        let assessment = self.evaluator.evaluate(receipt)?;
        let recommendation = self.classifier.classify(assessment.score)?;
        Ok(receipt.scored(assessment.score, assessment.flags, recommendation))
    }

    /// Score extraction output and append it to a session
    pub fn submit<'h>(
        &self,
        history: &'h mut SessionHistory,
        input: ReceiptInput,
        fallback_date: NaiveDate,
    ) -> Result<&'h Receipt> {
        let receipt = self.assess(input, fallback_date)?;
        info!(
            vendor = %receipt.vendor,
            amount = receipt.amount,
            score = ?receipt.risk_score,
            recommendation = ?receipt.recommendation,
            "Receipt scored"
        );
        history.push(receipt)
    }

    /// Aggregate a session's full history
    pub fn report(&self, history: &SessionHistory) -> Result<SpendReport> {
        aggregate_with(history.records(), &self.forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Recommendation};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn input(vendor: &str, amount: f64, category: &str) -> ReceiptInput {
        ReceiptInput {
            vendor: vendor.to_string(),
            amount,
            category: category.to_string(),
            date: None,
            image_ref: Some("img-1".to_string()),
        }
    }

    fn guardian() -> ExpenseGuardian {
        ExpenseGuardian::new(&RiskPolicy::default()).unwrap()
    }

    #[test]
    fn test_assess_scores_and_classifies() {
        let receipt = guardian()
            .assess(input("Generic Cash Co", 1500.0, "Entertainment"), today())
            .unwrap();

        // 40 + 30 + 15 + 10
        assert_eq!(receipt.risk_score, Some(95));
        assert_eq!(receipt.recommendation, Some(Recommendation::AutoReject));
        assert_eq!(receipt.category, Category::Entertainment);
        assert_eq!(receipt.image_ref.as_deref(), Some("img-1"));
    }

    #[test]
    fn test_clean_receipt_auto_approved() {
        let receipt = guardian()
            .assess(input("Staples", 23.99, "Office Supplies"), today())
            .unwrap();
        assert_eq!(receipt.risk_score, Some(0));
        assert!(receipt.flags.is_empty());
        assert_eq!(receipt.recommendation, Some(Recommendation::AutoApprove));
    }

    #[test]
    fn test_assess_rejects_negative_amount() {
        let err = guardian()
            .assess(input("ACME", -3.0, "Meals"), today())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_rescore_builds_new_record() {
        let g = guardian();
        let original = g.assess(input("ACME", 750.0, "Meals"), today()).unwrap();

        let stricter = RiskPolicy {
            thresholds: crate::policy::Thresholds {
                manual_review: 10,
                auto_reject: 20,
            },
            ..RiskPolicy::default()
        };
        let rescored = ExpenseGuardian::new(&stricter)
            .unwrap()
            .rescore(&original)
            .unwrap();

        assert_eq!(original.recommendation, Some(Recommendation::AutoApprove));
        assert_eq!(rescored.recommendation, Some(Recommendation::AutoReject));
        assert_eq!(rescored.risk_score, original.risk_score);
    }

    #[test]
    fn test_submit_appends() {
        let g = guardian();
        let mut history = SessionHistory::new();

        g.submit(&mut history, input("ACME", 10.0, "Meals"), today())
            .unwrap();
        g.submit(&mut history, input("Generic Cash Co", 150.0, "Meals"), today())
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().vendor, "Generic Cash Co");

        let report = g.report(&history).unwrap();
        assert_eq!(report.flagged_count, 1);
        assert_eq!(report.total_spend, 160.0);
    }

    #[test]
    fn test_failed_submit_leaves_history_untouched() {
        let g = guardian();
        let mut history = SessionHistory::new();
        assert!(g
            .submit(&mut history, input("", 10.0, "Meals"), today())
            .is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn test_push_rejects_unscored() {
        let receipt = Receipt::from_input(input("ACME", 10.0, "Meals"), today()).unwrap();
        let mut history = SessionHistory::new();
        assert!(history.push(receipt).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_serializes_as_list() {
        let g = guardian();
        let mut history = SessionHistory::new();
        g.submit(&mut history, input("ACME", 10.0, "Meals"), today())
            .unwrap();

        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());

        let back: SessionHistory = serde_json::from_value(json).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_history_rejects_unscored_json() {
        let json = serde_json::json!([{
            "vendor": "ACME",
            "amount": 10.0,
            "category": "Meals",
            "date": "2024-06-01"
        }]);
        assert!(serde_json::from_value::<SessionHistory>(json).is_err());
    }

    #[test]
    fn test_history_rejects_out_of_contract_json() {
        let json = serde_json::json!([{
            "vendor": "",
            "amount": 5000.0,
            "category": "Travel",
            "date": "2024-06-01",
            "risk_score": 250,
            "flags": [],
            "recommendation": "Auto-Approve"
        }]);
        assert!(serde_json::from_value::<SessionHistory>(json).is_err());
    }

    #[test]
    fn test_push_rejects_score_above_max() {
        let receipt = Receipt::from_input(input("ACME", 10.0, "Meals"), today()).unwrap();
        let bad = receipt.scored(999, vec!["Flag".into()], Recommendation::AutoReject);

        let mut history = SessionHistory::new();
        let err = history.push(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(history.is_empty());
    }

    #[test]
    fn test_push_requires_flags_iff_above_baseline() {
        let receipt = Receipt::from_input(input("ACME", 10.0, "Meals"), today()).unwrap();
        let mut history = SessionHistory::new();

        let silent = receipt.scored(40, Vec::new(), Recommendation::ManualReview);
        assert!(history.push(silent).is_err());

        let stray = receipt.scored(0, vec!["Flag".into()], Recommendation::AutoApprove);
        assert!(history.push(stray).is_err());

        let clean = receipt.scored(0, Vec::new(), Recommendation::AutoApprove);
        assert!(history.push(clean).is_ok());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_push_rejects_invalid_fields() {
        let receipt = Receipt::from_input(input("ACME", 10.0, "Meals"), today()).unwrap();
        let mut negative = receipt.scored(0, Vec::new(), Recommendation::AutoApprove);
        negative.amount = -10.0;

        let mut history = SessionHistory::new();
        assert!(history.push(negative).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn test_guardian_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExpenseGuardian>();
    }
}
