//! Risk tiers
//!
//! Lower numbers are stricter: tier 1 work touches critical paths and gets
//! the smallest budgets and the most requirements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk classification of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RiskTier {
    /// Tier 1: critical paths, auth, billing, migrations
    Critical,
    /// Tier 2: most feature work
    Standard,
    /// Tier 3: low-risk changes, docs, internal tooling
    Low,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Critical, RiskTier::Standard, RiskTier::Low];

    /// Numeric level (1-3)
    pub fn level(self) -> u8 {
        match self {
            RiskTier::Critical => 1,
            RiskTier::Standard => 2,
            RiskTier::Low => 3,
        }
    }

    /// Tier for an exact level
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(RiskTier::Critical),
            2 => Some(RiskTier::Standard),
            3 => Some(RiskTier::Low),
            _ => None,
        }
    }

    /// Nearest tier for any level: below 1 clamps to 1, above 3 to 3.
    pub fn clamp_level(level: i64) -> Self {
        match level {
            i64::MIN..=1 => RiskTier::Critical,
            2 => RiskTier::Standard,
            _ => RiskTier::Low,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.level())
    }
}

impl TryFrom<u8> for RiskTier {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        RiskTier::from_level(i64::from(level))
            .ok_or_else(|| format!("risk tier must be 1, 2 or 3, got {level}"))
    }
}

impl From<RiskTier> for u8 {
    fn from(tier: RiskTier) -> Self {
        tier.level()
    }
}
