//! Expense Guardian Core Library
//!
//! Decision logic for expense receipts:
//! - Receipt records and the closed category set
//! - Risk rule evaluation driven by a configurable rule table
//! - Three-way approval recommendation
//! - Spend aggregation and monthly forecast over a session history
//! - Policy loading (embedded defaults with a TOML override file)
//! - Parsing of extraction-step output

pub mod classify;
pub mod error;
pub mod extract;
pub mod insights;
pub mod models;
pub mod policy;
pub mod rules;
pub mod session;

pub use classify::Classifier;
pub use error::{Error, Result};
pub use extract::parse_extraction_response;
pub use insights::{aggregate, aggregate_with, CategoryTotal, SpendReport};
pub use models::{Category, Receipt, ReceiptInput, Recommendation};
pub use policy::{ForecastConfig, PolicySource, RiskPolicy, Thresholds};
pub use rules::{Assessment, PatternType, RiskEvaluator, RiskRule, RuleCondition};
pub use session::{ExpenseGuardian, SessionHistory};
