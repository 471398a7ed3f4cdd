//! Change budgets and utilization

use crate::result::Finding;
use crate::tier::RiskTier;
use crate::waiver::BudgetDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ceiling on files changed and lines of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_files: u32,
    pub max_loc: u32,
}

impl Budget {
    pub fn new(max_files: u32, max_loc: u32) -> Self {
        Self { max_files, max_loc }
    }

    /// Budget raised by a waiver delta
    pub fn with_delta(self, delta: BudgetDelta) -> Self {
        Self {
            max_files: self.max_files.saturating_add(delta.max_files),
            max_loc: self.max_loc.saturating_add(delta.max_loc),
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files / {} LOC", self.max_files, self.max_loc)
    }
}

/// Percent of the budget used.
///
/// Values are not clamped: over-budget work reports more than 100.
/// `overall_pct` is the larger of the two dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub files_pct: f64,
    pub loc_pct: f64,
    pub overall_pct: f64,
}

impl Utilization {
    /// Copy capped at 100 for display
    pub fn clamped(&self) -> Self {
        Self {
            files_pct: self.files_pct.min(100.0),
            loc_pct: self.loc_pct.min(100.0),
            overall_pct: self.overall_pct.min(100.0),
        }
    }

    pub fn exceeds_budget(&self) -> bool {
        self.overall_pct > 100.0
    }
}

/// How close utilization is to the ceiling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitNotice {
    #[default]
    None,
    /// At or above 80%
    Notice,
    /// At or above 90%
    Warning,
    /// At or above 95%
    Critical,
}

impl LimitNotice {
    /// Highest notice reached by a percentage
    pub fn from_pct(pct: f64) -> Self {
        if pct >= 95.0 {
            LimitNotice::Critical
        } else if pct >= 90.0 {
            LimitNotice::Warning
        } else if pct >= 80.0 {
            LimitNotice::Notice
        } else {
            LimitNotice::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LimitNotice::None => "none",
            LimitNotice::Notice => "notice",
            LimitNotice::Warning => "warning",
            LimitNotice::Critical => "critical",
        }
    }
}

/// A waiver that raised the budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedWaiver {
    pub id: String,
    pub delta: BudgetDelta,
}

/// Derived budget for a unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResult {
    pub tier: RiskTier,

    /// Budget from the policy tier
    pub baseline: Budget,

    /// Baseline plus effective waiver deltas
    pub effective: Budget,

    pub applied_waivers: Vec<AppliedWaiver>,

    /// Waivers supplied but not effective, and similar advisories
    pub warnings: Vec<Finding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<Utilization>,

    #[serde(default)]
    pub limit_notice: LimitNotice,
}

impl BudgetResult {
    pub fn applied_waiver_ids(&self) -> Vec<&str> {
        self.applied_waivers.iter().map(|w| w.id.as_str()).collect()
    }
}
