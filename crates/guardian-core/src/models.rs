//! Domain models for Expense Guardian

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Expense category
///
/// The set is closed: names the extractor produces that do not map onto one of
/// these variants fall back to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Travel,
    Meals,
    OfficeSupplies,
    Software,
    Entertainment,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Travel => "Travel",
            Self::Meals => "Meals",
            Self::OfficeSupplies => "Office Supplies",
            Self::Software => "Software",
            Self::Entertainment => "Entertainment",
            Self::Other => "Other",
        }
    }

    /// Get all categories
    pub fn all() -> &'static [Category] {
        &[
            Self::Travel,
            Self::Meals,
            Self::OfficeSupplies,
            Self::Software,
            Self::Entertainment,
            Self::Other,
        ]
    }

    /// Map a free-form category name onto the closed set, if it is recognized
    ///
    /// Matching ignores case, spaces, `_` and `-`, and accepts the synonyms
    /// extractors commonly emit ("Dining", "Airfare", "Subscriptions", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "travel" | "airfare" | "flights" | "lodging" | "hotel" | "transport"
            | "transportation" => Some(Self::Travel),
            "meals" | "meal" | "dining" | "food" | "restaurant" | "restaurants" => {
                Some(Self::Meals)
            }
            "officesupplies" | "office" | "supplies" => Some(Self::OfficeSupplies),
            "software" | "subscriptions" | "saas" => Some(Self::Software),
            "entertainment" => Some(Self::Entertainment),
            "other" | "misc" | "miscellaneous" | "uncategorized" => Some(Self::Other),
            _ => None,
        }
    }

    /// Like [`Category::from_name`], falling back to `Other`
    pub fn parse_lossy(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!(category = name, "Unknown category, using Other");
            Self::Other
        })
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self::parse_lossy(&name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approval recommendation derived from a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Auto-Approve")]
    AutoApprove,
    #[serde(rename = "Manual-Review")]
    ManualReview,
    #[serde(rename = "Auto-Reject")]
    AutoReject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoApprove => "Auto-Approve",
            Self::ManualReview => "Manual-Review",
            Self::AutoReject => "Auto-Reject",
        }
    }

    /// Anything other than auto-approval counts as flagged
    pub fn is_flagged(&self) -> bool {
        !matches!(self, Self::AutoApprove)
    }
}

impl std::str::FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "auto-approve" => Ok(Self::AutoApprove),
            "manual-review" => Ok(Self::ManualReview),
            "auto-reject" => Ok(Self::AutoReject),
            _ => Err(format!("Unknown recommendation: {}", s)),
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured record handed over by the extraction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptInput {
    pub vendor: String,
    pub amount: f64,
    pub category: String,
    /// Transaction date, when the extractor found one
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Opaque reference to the source image, never interpreted
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// A receipt record
///
/// Scoring fields stay `None`/empty until the record has been evaluated.
/// Records are never edited after scoring; re-scoring builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub vendor: String,
    /// Non-negative amount in the single configured currency
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    #[serde(default)]
    pub image_ref: Option<String>,
    /// 0-100, absent until evaluated
    #[serde(default)]
    pub risk_score: Option<u32>,
    /// Labels of the rules that fired, in rule-definition order
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
}

impl Receipt {
    /// Build an unscored record from extraction output
    ///
    /// `fallback_date` is used when the extractor did not supply a date.
    pub fn from_input(input: ReceiptInput, fallback_date: NaiveDate) -> Result<Self> {
        let vendor = input.vendor.trim().to_string();
        validate_vendor(&vendor)?;
        validate_amount(input.amount)?;

        Ok(Self {
            vendor,
            amount: input.amount,
            category: Category::parse_lossy(&input.category),
            date: input.date.unwrap_or(fallback_date),
            image_ref: input.image_ref,
            risk_score: None,
            flags: Vec::new(),
            recommendation: None,
        })
    }

    /// Whether both the score and the recommendation have been computed
    pub fn is_scored(&self) -> bool {
        self.risk_score.is_some() && self.recommendation.is_some()
    }

    /// A copy of this record carrying the given scoring results
    pub(crate) fn scored(
        &self,
        risk_score: u32,
        flags: Vec<String>,
        recommendation: Recommendation,
    ) -> Self {
        Self {
            risk_score: Some(risk_score),
            flags,
            recommendation: Some(recommendation),
            ..self.clone()
        }
    }

    /// Same extracted fields with scoring cleared
    pub fn unscored(&self) -> Self {
        Self {
            risk_score: None,
            flags: Vec::new(),
            recommendation: None,
            ..self.clone()
        }
    }

    /// Check the extracted fields are within contract
    pub fn validate(&self) -> Result<()> {
        validate_vendor(&self.vendor)?;
        validate_amount(self.amount)
    }
}

fn validate_vendor(vendor: &str) -> Result<()> {
    if vendor.trim().is_empty() {
        return Err(Error::InvalidInput("vendor must not be empty".into()));
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::InvalidInput(format!(
            "amount must be a finite number, got {}",
            amount
        )));
    }
    if amount < 0.0 {
        return Err(Error::InvalidInput(format!(
            "amount must be non-negative, got {:.2}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn input(vendor: &str, amount: f64, category: &str) -> ReceiptInput {
        ReceiptInput {
            vendor: vendor.to_string(),
            amount,
            category: category.to_string(),
            date: None,
            image_ref: None,
        }
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(Category::from_name("Travel"), Some(Category::Travel));
        assert_eq!(
            Category::from_name("office supplies"),
            Some(Category::OfficeSupplies)
        );
        assert_eq!(
            Category::from_name("OFFICE_SUPPLIES"),
            Some(Category::OfficeSupplies)
        );
        assert_eq!(Category::from_name("Dining"), Some(Category::Meals));
        assert_eq!(Category::from_name("Client Gifts"), None);
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        assert_eq!(Category::parse_lossy("Groceries"), Category::Other);
        assert!("Groceries".parse::<Category>().is_err());

        let category: Category = serde_json::from_str("\"Client Gifts\"").unwrap();
        assert_eq!(category, Category::Other);
    }

    #[test]
    fn test_category_serializes_display_name() {
        let json = serde_json::to_string(&Category::OfficeSupplies).unwrap();
        assert_eq!(json, "\"Office Supplies\"");
    }

    #[test]
    fn test_recommendation_names() {
        assert_eq!(
            serde_json::to_string(&Recommendation::ManualReview).unwrap(),
            "\"Manual-Review\""
        );
        assert_eq!(
            "auto_reject".parse::<Recommendation>().unwrap(),
            Recommendation::AutoReject
        );
        assert!(!Recommendation::AutoApprove.is_flagged());
        assert!(Recommendation::ManualReview.is_flagged());
        assert!(Recommendation::AutoReject.is_flagged());
    }

    #[test]
    fn test_from_input_uses_fallback_date() {
        let receipt = Receipt::from_input(input("  ACME  ", 12.5, "Meals"), date()).unwrap();
        assert_eq!(receipt.vendor, "ACME");
        assert_eq!(receipt.date, date());
        assert_eq!(receipt.category, Category::Meals);
        assert!(!receipt.is_scored());
        assert!(receipt.flags.is_empty());
    }

    #[test]
    fn test_from_input_keeps_extracted_date() {
        let mut raw = input("ACME", 10.0, "Travel");
        raw.date = NaiveDate::from_ymd_opt(2024, 1, 2);
        let receipt = Receipt::from_input(raw, date()).unwrap();
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_from_input_rejects_negative_amount() {
        let err = Receipt::from_input(input("ACME", -1.0, "Travel"), date()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_from_input_rejects_empty_vendor() {
        let err = Receipt::from_input(input("   ", 1.0, "Travel"), date()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_from_input_rejects_nan() {
        assert!(Receipt::from_input(input("ACME", f64::NAN, "Travel"), date()).is_err());
    }

    #[test]
    fn test_scored_leaves_original_untouched() {
        let receipt = Receipt::from_input(input("ACME", 1500.0, "Travel"), date()).unwrap();
        let scored = receipt.scored(
            40,
            vec!["High amount".into()],
            Recommendation::ManualReview,
        );

        assert!(scored.is_scored());
        assert!(!receipt.is_scored());
        assert_eq!(scored.unscored(), receipt);
    }
}
