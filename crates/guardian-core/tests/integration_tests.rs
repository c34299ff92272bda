//! Integration tests for guardian-core
//!
//! These tests exercise the full extract → score → history → report workflow.

use chrono::NaiveDate;
use guardian_core::{
    aggregate, parse_extraction_response, Category, ExpenseGuardian, Receipt, ReceiptInput,
    Recommendation, RiskEvaluator, RiskPolicy, SessionHistory,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn input(vendor: &str, amount: f64, category: &str, date: u32) -> ReceiptInput {
    ReceiptInput {
        vendor: vendor.to_string(),
        amount,
        category: category.to_string(),
        date: Some(day(date)),
        image_ref: None,
    }
}

// =============================================================================
// Scoring
// =============================================================================

#[test]
fn test_high_amount_without_elevated_delta() {
    let policy = RiskPolicy::default();
    let evaluator = RiskEvaluator::from_policy(&policy).unwrap();
    let receipt = Receipt::from_input(input("ACME", 1500.0, "Travel", 1), day(1)).unwrap();

    let assessment = evaluator.evaluate(&receipt).unwrap();
    assert!(assessment.flags.iter().any(|f| f == "High amount"));
    assert!(!assessment.flags.iter().any(|f| f == "Elevated amount"));
    assert!(assessment.score >= 40);
    assert!(assessment.score < 60);
}

#[test]
fn test_denylisted_vendor() {
    let guardian = ExpenseGuardian::new(&RiskPolicy::default()).unwrap();
    let receipt = guardian
        .assess(input("Generic Cash Co", 150.0, "Meals", 1), day(1))
        .unwrap();

    assert!(receipt.flags.contains(&"Suspicious vendor".to_string()));
    assert!(receipt.risk_score.unwrap() >= 30);
    assert_eq!(receipt.recommendation, Some(Recommendation::ManualReview));
}

#[test]
fn test_unknown_category_scored_as_other() {
    let guardian = ExpenseGuardian::new(&RiskPolicy::default()).unwrap();
    let receipt = guardian
        .assess(input("Florist", 40.0, "Client Gifts", 1), day(1))
        .unwrap();
    assert_eq!(receipt.category, Category::Other);
}

#[test]
fn test_custom_policy_changes_outcome() {
    let policy = RiskPolicy::from_toml(
        r#"
        [thresholds]
        manual_review = 10

        [[rules]]
        kind = "category"
        flag = "Software spend"
        points = 12
        categories = ["Software"]
        "#,
    )
    .unwrap();
    let guardian = ExpenseGuardian::new(&policy).unwrap();

    let receipt = guardian
        .assess(input("JetBrains", 249.0, "Software", 1), day(1))
        .unwrap();
    assert_eq!(receipt.flags, vec!["Software spend"]);
    assert_eq!(receipt.risk_score, Some(12));
    assert_eq!(receipt.recommendation, Some(Recommendation::ManualReview));
}

// =============================================================================
// Workflow
// =============================================================================

#[test]
fn test_extract_score_report_workflow() {
    let guardian = ExpenseGuardian::new(&RiskPolicy::default()).unwrap();
    let mut history = SessionHistory::new();

    let responses = [
        r#"```json
        {"vendor": "Hilton", "date": "2024-07-01", "amount": 620.0, "category": "Travel"}
        ```"#,
        r#"{"vendor": "Blue Bottle", "date": "2024-07-01", "amount": 14.5, "category": "Dining"}"#,
        r#"Here you go: {"vendor": "Lucky 7 Casino", "date": "2024-07-03", "amount": "1,300", "category": "Entertainment"}"#,
    ];

    for response in responses {
        let parsed = parse_extraction_response(response).unwrap();
        guardian.submit(&mut history, parsed, day(10)).unwrap();
    }

    assert_eq!(history.len(), 3);
    let recommendations: Vec<_> = history
        .iter()
        .map(|r| r.recommendation.unwrap())
        .collect();
    assert_eq!(
        recommendations,
        vec![
            Recommendation::AutoApprove,
            Recommendation::AutoApprove,
            Recommendation::AutoReject,
        ]
    );

    let report = guardian.report(&history).unwrap();
    assert_eq!(report.receipt_count, 3);
    assert_eq!(report.flagged_count, 1);
    assert_eq!(report.distinct_days, 2);
    assert_eq!(report.category_total(Category::Meals), 14.5);
    assert_eq!(report.highest_category, Some(Category::Entertainment));
    assert!((report.average_daily_spend - 1934.5 / 2.0).abs() < 1e-9);
    assert!((report.forecast_month - 1934.5 * 15.0).abs() < 1e-6);
}

#[test]
fn test_empty_report() {
    let report = aggregate(&[]).unwrap();
    assert_eq!(report.total_spend, 0.0);
    assert_eq!(report.flagged_count, 0);
    assert_eq!(report.forecast_month, 0.0);
}

#[test]
fn test_unscored_record_fails_report() {
    let receipt = Receipt::from_input(input("ACME", 10.0, "Meals", 1), day(1)).unwrap();
    assert!(aggregate(&[receipt]).is_err());
}

// =============================================================================
// Interchange format
// =============================================================================

#[test]
fn test_scored_receipt_round_trip() {
    let guardian = ExpenseGuardian::new(&RiskPolicy::default()).unwrap();
    let mut raw = input("Generic Cash Co", 1200.0, "Office Supplies", 4);
    raw.image_ref = Some("uploads/2024/07/receipt-0042.png".to_string());
    let receipt = guardian.assess(raw, day(4)).unwrap();

    let json = serde_json::to_string(&receipt).unwrap();
    let back: Receipt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, receipt);
}

#[test]
fn test_receipt_json_field_names() {
    let guardian = ExpenseGuardian::new(&RiskPolicy::default()).unwrap();
    let receipt = guardian
        .assess(input("Generic Cash Co", 150.0, "Office Supplies", 4), day(4))
        .unwrap();

    let value = serde_json::to_value(&receipt).unwrap();
    assert_eq!(value["vendor"], "Generic Cash Co");
    assert_eq!(value["category"], "Office Supplies");
    assert_eq!(value["risk_score"], 30);
    assert_eq!(value["flags"][0], "Suspicious vendor");
    assert_eq!(value["recommendation"], "Manual-Review");
    assert_eq!(value["date"], "2024-07-04");
}
