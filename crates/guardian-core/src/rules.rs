//! Risk rule evaluation
//!
//! Rules are data: an ordered table of [`RiskRule`] descriptors, each pairing a
//! condition with a point delta and the flag it raises. The evaluator walks the
//! table uniformly, so new policies only need new table entries.
//!
//! Rules that share a `tier` are mutually exclusive. When several rules in one
//! tier match, only the one worth the most points fires (the earliest wins a
//! tie). This keeps a single dimension, such as the amount, from being
//! penalized twice.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Category, Receipt};
use crate::policy::RiskPolicy;

/// Highest possible risk score
pub const MAX_SCORE: u32 = 100;

/// Score of a receipt no rule fired for
pub const BASELINE_SCORE: u32 = 0;

/// Pattern matching type for vendor rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Case-insensitive substring match (supports | for OR)
    #[default]
    Contains,
    /// Regular expression match
    Regex,
    /// Exact string match (case-insensitive)
    Exact,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Regex => "regex",
            Self::Exact => "exact",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "regex" => Ok(Self::Regex),
            "exact" => Ok(Self::Exact),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// What a rule checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    /// `above < amount`, and `amount <= at_most` when an upper bound is set
    Amount {
        above: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_most: Option<f64>,
    },
    /// Vendor name matches any of the patterns
    Vendor {
        patterns: Vec<String>,
        #[serde(default, rename = "match")]
        pattern_type: PatternType,
    },
    /// Category is one of the listed ones
    Category { categories: Vec<Category> },
    /// Amount is an exact multiple of `multiple` and exceeds `above`
    RoundAmount { multiple: f64, above: f64 },
}

/// One entry of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    /// Label appended to the receipt's flags when the rule fires
    pub flag: String,
    /// Points added to the score when the rule fires (always > 0)
    pub points: u32,
    /// Mutual-exclusion group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(flatten)]
    pub condition: RuleCondition,
}

impl RiskRule {
    pub fn new(flag: impl Into<String>, points: u32, condition: RuleCondition) -> Self {
        Self {
            flag: flag.into(),
            points,
            tier: None,
            condition,
        }
    }

    pub fn in_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }
}

/// Result of evaluating a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Sum of fired deltas, clamped to 0-100
    pub score: u32,
    /// Fired rule labels, in rule-definition order
    pub flags: Vec<String>,
}

/// Compiled vendor pattern
#[derive(Debug, Clone)]
enum VendorMatcher {
    Contains(Vec<String>),
    Regex(Regex),
    Exact(String),
}

impl VendorMatcher {
    fn compile(pattern: &str, pattern_type: PatternType) -> Result<Self> {
        Ok(match pattern_type {
            PatternType::Contains => Self::Contains(
                pattern
                    .split('|')
                    .map(|p| p.trim().to_uppercase())
                    .filter(|p| !p.is_empty())
                    .collect(),
            ),
            PatternType::Regex => Self::Regex(Regex::new(pattern)?),
            PatternType::Exact => Self::Exact(pattern.trim().to_uppercase()),
        })
    }

    fn matches(&self, vendor: &str) -> bool {
        let vendor_upper = vendor.to_uppercase();

        match self {
            Self::Contains(parts) => parts.iter().any(|p| vendor_upper.contains(p.as_str())),
            Self::Regex(re) => re.is_match(vendor) || re.is_match(&vendor_upper),
            Self::Exact(expected) => vendor_upper.trim() == expected,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: RiskRule,
    vendor_matchers: Vec<VendorMatcher>,
}

impl CompiledRule {
    fn compile(rule: RiskRule) -> Result<Self> {
        validate_rule(&rule)?;

        let vendor_matchers = match &rule.condition {
            RuleCondition::Vendor {
                patterns,
                pattern_type,
            } => patterns
                .iter()
                .map(|p| VendorMatcher::compile(p, *pattern_type))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            rule,
            vendor_matchers,
        })
    }

    fn matches(&self, receipt: &Receipt) -> bool {
        match &self.rule.condition {
            RuleCondition::Amount { above, at_most } => {
                receipt.amount > *above && at_most.map_or(true, |max| receipt.amount <= max)
            }
            RuleCondition::Vendor { .. } => self
                .vendor_matchers
                .iter()
                .any(|m| m.matches(&receipt.vendor)),
            RuleCondition::Category { categories } => categories.contains(&receipt.category),
            RuleCondition::RoundAmount { multiple, above } => {
                receipt.amount > *above && receipt.amount % multiple == 0.0
            }
        }
    }
}

fn validate_rule(rule: &RiskRule) -> Result<()> {
    let invalid = |msg: String| {
        Err(Error::InvalidPolicy(format!("rule '{}': {}", rule.flag, msg)))
    };

    if rule.flag.trim().is_empty() {
        return Err(Error::InvalidPolicy("rule flag must not be empty".into()));
    }
    if rule.points == 0 {
        return invalid("points must be greater than zero".into());
    }

    match &rule.condition {
        RuleCondition::Amount { above, at_most } => {
            if !above.is_finite() {
                return invalid(format!("amount bound {} is not finite", above));
            }
            if let Some(max) = at_most {
                if !max.is_finite() || max < above {
                    return invalid(format!("upper bound {} must be at least {}", max, above));
                }
            }
        }
        RuleCondition::Vendor { patterns, .. } => {
            if patterns.is_empty() {
                return invalid("vendor rule needs at least one pattern".into());
            }
            // An empty regex matches every vendor
            if patterns.iter().any(|p| p.trim().is_empty()) {
                return invalid("vendor patterns must not be blank".into());
            }
        }
        RuleCondition::Category { categories } => {
            if categories.is_empty() {
                return invalid("category rule needs at least one category".into());
            }
        }
        RuleCondition::RoundAmount { multiple, above } => {
            if !multiple.is_finite() || *multiple <= 0.0 {
                return invalid(format!("multiple must be positive, got {}", multiple));
            }
            if !above.is_finite() {
                return invalid(format!("amount bound {} is not finite", above));
            }
        }
    }

    Ok(())
}

/// Evaluates receipts against a rule table
#[derive(Debug, Clone)]
pub struct RiskEvaluator {
    rules: Vec<CompiledRule>,
}

impl RiskEvaluator {
    /// Compile a rule table, rejecting malformed rules
    pub fn new(rules: Vec<RiskRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_policy(policy: &RiskPolicy) -> Result<Self> {
        Self::new(policy.rules.clone())
    }

    /// The rule table in definition order
    pub fn rules(&self) -> impl Iterator<Item = &RiskRule> {
        self.rules.iter().map(|r| &r.rule)
    }

    /// Score a receipt
    ///
    /// Only the extracted fields are read; any existing score on the record is
    /// ignored, so evaluating the same record twice gives the same result.
    pub fn evaluate(&self, receipt: &Receipt) -> Result<Assessment> {
        receipt.validate()?;

        let matched: Vec<bool> = self.rules.iter().map(|r| r.matches(receipt)).collect();

        // Pick the winner of each tier before walking the table in order
        let mut tier_winners: HashMap<&str, usize> = HashMap::new();
        for (idx, compiled) in self.rules.iter().enumerate() {
            if !matched[idx] {
                continue;
            }
            if let Some(tier) = compiled.rule.tier.as_deref() {
                match tier_winners.get(tier) {
                    Some(&winner) if self.rules[winner].rule.points >= compiled.rule.points => {}
                    _ => {
                        tier_winners.insert(tier, idx);
                    }
                }
            }
        }

        let mut total: u32 = BASELINE_SCORE;
        let mut flags = Vec::new();

        for (idx, compiled) in self.rules.iter().enumerate() {
            if !matched[idx] {
                continue;
            }
            if let Some(tier) = compiled.rule.tier.as_deref() {
                if tier_winners.get(tier) != Some(&idx) {
                    continue;
                }
            }

            debug!(
                vendor = %receipt.vendor,
                flag = %compiled.rule.flag,
                points = compiled.rule.points,
                "Risk rule fired"
            );
            total = total.saturating_add(compiled.rule.points);
            flags.push(compiled.rule.flag.clone());
        }

        Ok(Assessment {
            score: total.min(MAX_SCORE),
            flags,
        })
    }
}
