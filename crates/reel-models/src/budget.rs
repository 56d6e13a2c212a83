//! Budget tiers controlling visual generation spend.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Generation ratios per tier.
pub const MICRO_GENERATION_RATIO: f64 = 0.0;
pub const LOW_GENERATION_RATIO: f64 = 0.10;
pub const MEDIUM_GENERATION_RATIO: f64 = 0.27;
pub const HIGH_GENERATION_RATIO: f64 = 0.55;
pub const FULL_GENERATION_RATIO: f64 = 1.0;

/// Budget tier: what fraction of non-figure segments may receive a freshly
/// generated visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    /// No generated visuals at all
    Micro,
    /// Generated visuals for the most important tenth of segments
    #[default]
    Low,
    Medium,
    High,
    /// Every non-figure segment gets a generated visual
    Full,
}

impl BudgetTier {
    /// Fraction of non-figure segments eligible for a generated visual.
    pub fn generation_ratio(&self) -> f64 {
        match self {
            BudgetTier::Micro => MICRO_GENERATION_RATIO,
            BudgetTier::Low => LOW_GENERATION_RATIO,
            BudgetTier::Medium => MEDIUM_GENERATION_RATIO,
            BudgetTier::High => HIGH_GENERATION_RATIO,
            BudgetTier::Full => FULL_GENERATION_RATIO,
        }
    }

    /// Get the tier name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::Micro => "micro",
            BudgetTier::Low => "low",
            BudgetTier::Medium => "medium",
            BudgetTier::High => "high",
            BudgetTier::Full => "full",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BudgetTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(BudgetTier::Micro),
            "low" => Ok(BudgetTier::Low),
            "medium" => Ok(BudgetTier::Medium),
            "high" => Ok(BudgetTier::High),
            "full" => Ok(BudgetTier::Full),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

/// Unknown tier names are a fatal input error.
#[derive(Debug, Error)]
#[error("Unknown budget tier: {0}")]
pub struct TierParseError(String);
