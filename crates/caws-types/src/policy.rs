//! Project policy
//!
//! One policy document per project maps each risk tier to its budget and
//! quality thresholds, plus optional waiver approval rules.

use crate::budget::Budget;
use crate::tier::RiskTier;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Approvals a waiver needs when the policy does not say otherwise
pub const DEFAULT_REQUIRED_APPROVERS: u32 = 1;

/// Governing policy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy schema version
    #[serde(deserialize_with = "version_string")]
    pub version: String,

    /// Per-tier settings keyed by tier level (1-3)
    pub risk_tiers: BTreeMap<u8, TierPolicy>,

    /// Waiver approval rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiver_approval: Option<WaiverApproval>,
}

/// Budget and thresholds for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    pub max_files: u32,
    pub max_loc: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_review_required: Option<bool>,
}

impl TierPolicy {
    /// Baseline budget before waivers
    pub fn baseline(&self) -> Budget {
        Budget::new(self.max_files, self.max_loc)
    }

    pub fn requires_contracts(&self) -> bool {
        self.contracts_required.unwrap_or(false)
    }

    pub fn requires_manual_review(&self) -> bool {
        self.manual_review_required.unwrap_or(false)
    }
}

/// Waiver approval rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiverApproval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approvers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_days: Option<u32>,
}

impl Policy {
    /// Built-in policy used when a project has none.
    ///
    /// Tier 1: 25 files / 1000 LOC, tier 2: 50 / 2000, tier 3: 100 / 5000.
    pub fn default_policy() -> Self {
        let tier = |level: RiskTier, coverage, mutation, contracts, review| {
            let budget = Self::builtin_baseline(level);
            TierPolicy {
                max_files: budget.max_files,
                max_loc: budget.max_loc,
                coverage_threshold: Some(coverage),
                mutation_threshold: Some(mutation),
                contracts_required: Some(contracts),
                manual_review_required: Some(review),
            }
        };

        let mut risk_tiers = BTreeMap::new();
        for (level, coverage, mutation, contracts, review) in [
            (RiskTier::Critical, 90.0, 70.0, true, true),
            (RiskTier::Standard, 80.0, 50.0, true, false),
            (RiskTier::Low, 70.0, 30.0, false, false),
        ] {
            risk_tiers.insert(
                level.level(),
                tier(level, coverage, mutation, contracts, review),
            );
        }

        Self {
            version: "1".to_string(),
            risk_tiers,
            waiver_approval: Some(WaiverApproval {
                required_approvers: Some(DEFAULT_REQUIRED_APPROVERS),
                max_duration_days: Some(90),
            }),
        }
    }

    /// Built-in budget for a tier, used when no policy declares one
    pub fn builtin_baseline(tier: RiskTier) -> Budget {
        match tier {
            RiskTier::Critical => Budget::new(25, 1000),
            RiskTier::Standard => Budget::new(50, 2000),
            RiskTier::Low => Budget::new(100, 5000),
        }
    }

    /// Settings for a tier, if the policy declares it
    pub fn tier(&self, tier: RiskTier) -> Option<&TierPolicy> {
        self.risk_tiers.get(&tier.level())
    }

    /// Approvals a waiver needs under this policy
    pub fn required_approvers(&self) -> u32 {
        self.waiver_approval
            .as_ref()
            .and_then(|w| w.required_approvers)
            .unwrap_or(DEFAULT_REQUIRED_APPROVERS)
    }

    pub fn max_waiver_duration_days(&self) -> Option<u32> {
        self.waiver_approval
            .as_ref()
            .and_then(|w| w.max_duration_days)
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::default_policy()
    }
}

// Authors write `version: 1`, `version: 1.2` or `version: "1.2.0"`.
fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(s) => s,
        Repr::Int(i) => i.to_string(),
        Repr::Float(f) => f.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_policy_budgets() {
        let policy = Policy::default_policy();
        assert_eq!(
            policy.tier(RiskTier::Critical).unwrap().baseline(),
            Budget::new(25, 1000)
        );
        assert_eq!(
            policy.tier(RiskTier::Standard).unwrap().baseline(),
            Budget::new(50, 2000)
        );
        assert_eq!(
            policy.tier(RiskTier::Low).unwrap().baseline(),
            Budget::new(100, 5000)
        );
        assert_eq!(policy.required_approvers(), 1);
    }

    #[test]
    fn test_policy_from_json_with_string_keys() {
        let value = json!({
            "version": 2,
            "risk_tiers": {
                "1": { "max_files": 10, "max_loc": 300, "contracts_required": true },
                "3": { "max_files": 80, "max_loc": 4000 }
            },
            "waiver_approval": { "required_approvers": 2 }
        });

        let policy: Policy = serde_json::from_value(value).unwrap();
        assert_eq!(policy.version, "2");
        assert!(policy.tier(RiskTier::Critical).unwrap().requires_contracts());
        assert!(policy.tier(RiskTier::Standard).is_none());
        assert!(!policy.tier(RiskTier::Low).unwrap().requires_contracts());
        assert_eq!(policy.required_approvers(), 2);
        assert!(policy.max_waiver_duration_days().is_none());
    }

    #[test]
    fn test_required_approvers_defaults_to_one() {
        let mut policy = Policy::default_policy();
        policy.waiver_approval = None;
        assert_eq!(policy.required_approvers(), DEFAULT_REQUIRED_APPROVERS);
    }
}
