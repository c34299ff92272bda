//! Risk policy configuration
//!
//! Everything that encodes business policy lives here: the rule table, the
//! classifier cutoffs, and the forecast horizon. All of it can be overridden
//! without code changes.
//!
//! ## Configuration Resolution
//!
//! Policy is loaded with a two-layer resolution:
//! 1. Check for an override file (explicit path, or
//!    ~/.local/share/expense-guardian/config/policy.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! An override file only replaces the sections it names.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Category;
use crate::rules::{PatternType, RiskEvaluator, RiskRule, RuleCondition, MAX_SCORE};

/// Embedded default policy (compiled into binary)
const DEFAULT_POLICY: &str = include_str!("../../../config/policy.toml");

/// Classifier cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lowest score that needs a human look
    pub manual_review: u32,
    /// Lowest score that is rejected outright
    pub auto_reject: u32,
}

impl Thresholds {
    /// Cutoffs must be ordered and within the score range
    pub fn validate(&self) -> Result<()> {
        if self.manual_review > self.auto_reject {
            return Err(Error::InvalidPolicy(format!(
                "manual_review ({}) must not exceed auto_reject ({})",
                self.manual_review, self.auto_reject
            )));
        }
        if self.auto_reject > MAX_SCORE {
            return Err(Error::InvalidPolicy(format!(
                "auto_reject ({}) must be at most {}",
                self.auto_reject, MAX_SCORE
            )));
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            manual_review: 30,
            auto_reject: 70,
        }
    }
}

/// Forecast settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Days the average daily spend is projected over
    pub days: u32,
    /// How many categories the top spend breakdown lists
    pub top_categories: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            days: 30,
            top_categories: 3,
        }
    }
}

/// Complete policy consumed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub thresholds: Thresholds,
    pub forecast: ForecastConfig,
    pub rules: Vec<RiskRule>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            forecast: ForecastConfig::default(),
            rules: default_rules(),
        }
    }
}

/// Where a loaded policy came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded defaults"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The built-in rule table
pub fn default_rules() -> Vec<RiskRule> {
    vec![
        RiskRule::new(
            "High amount",
            40,
            RuleCondition::Amount {
                above: 1000.0,
                at_most: None,
            },
        )
        .in_tier("amount"),
        RiskRule::new(
            "Elevated amount",
            20,
            RuleCondition::Amount {
                above: 500.0,
                at_most: Some(1000.0),
            },
        )
        .in_tier("amount"),
        RiskRule::new(
            "Suspicious vendor",
            30,
            RuleCondition::Vendor {
                patterns: vec![
                    r"(?i)\b(cash|generic|atm|money ?orders?|gift ?cards?|prepaid|western union|casino|liquor)\b"
                        .to_string(),
                ],
                pattern_type: PatternType::Regex,
            },
        ),
        RiskRule::new(
            "High-risk category",
            15,
            RuleCondition::Category {
                categories: vec![Category::Entertainment],
            },
        ),
        RiskRule::new(
            "Suspicious round amount",
            10,
            RuleCondition::RoundAmount {
                multiple: 100.0,
                above: 200.0,
            },
        ),
    ]
}

impl RiskPolicy {
    /// Parse a policy file, layering it over the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawPolicy = toml::from_str(content)
            .map_err(|e| Error::InvalidPolicy(format!("Invalid policy TOML: {}", e)))?;

        let mut policy = RiskPolicy::default();

        if let Some(thresholds) = raw.thresholds {
            if let Some(review) = thresholds.manual_review {
                policy.thresholds.manual_review = review;
            }
            if let Some(reject) = thresholds.auto_reject {
                policy.thresholds.auto_reject = reject;
            }
        }

        if let Some(forecast) = raw.forecast {
            if let Some(days) = forecast.days {
                policy.forecast.days = days;
            }
            if let Some(top) = forecast.top_categories {
                policy.forecast.top_categories = top;
            }
        }

        if let Some(rules) = raw.rules {
            policy.rules = rules;
        }

        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy is internally consistent
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.forecast.days == 0 {
            return Err(Error::InvalidPolicy(
                "forecast days must be greater than zero".into(),
            ));
        }

        // Compiling the table catches bad rules and patterns
        RiskEvaluator::new(self.rules.clone())?;
        Ok(())
    }

    /// Load the policy (override first, then embedded default)
    pub fn load(override_path: Option<&Path>) -> Result<(Self, PolicySource)> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_policy_path(),
        };

        if let Some(path) = path {
            if path.exists() {
                debug!(path = %path.display(), "Loading policy override");
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::InvalidPolicy(format!("Failed to read {}: {}", path.display(), e))
                })?;
                return Ok((Self::from_toml(&content)?, PolicySource::File(path)));
            }
            if override_path.is_some() {
                warn!(path = %path.display(), "Policy file not found, using embedded defaults");
            }
        }

        Ok((Self::embedded()?, PolicySource::Embedded))
    }

    /// The policy compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_POLICY)
    }
}

/// Default policy override path
pub fn default_policy_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| {
        d.join("expense-guardian")
            .join("config")
            .join("policy.toml")
    })
}

/// Raw policy structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawPolicy {
    thresholds: Option<RawThresholds>,
    forecast: Option<RawForecast>,
    rules: Option<Vec<RiskRule>>,
}

#[derive(Debug, Deserialize)]
struct RawThresholds {
    manual_review: Option<u32>,
    auto_reject: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    days: Option<u32>,
    top_categories: Option<usize>,
}
