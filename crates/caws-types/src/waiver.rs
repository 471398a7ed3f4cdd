//! Waivers
//!
//! A waiver is a time-boxed, approved exception that relaxes one or more
//! named gates. Waivers are created externally and never mutated here:
//! expiry and revocation are detected, not written back.

use crate::document::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Gate name that budget increases are granted under
pub const BUDGET_LIMIT_GATE: &str = "budget_limit";

/// Waiver lifecycle status as recorded in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaiverStatus {
    Active,
    Expired,
    Revoked,
}

impl WaiverStatus {
    pub const ALL: [WaiverStatus; 3] = [
        WaiverStatus::Active,
        WaiverStatus::Expired,
        WaiverStatus::Revoked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WaiverStatus::Active => "active",
            WaiverStatus::Expired => "expired",
            WaiverStatus::Revoked => "revoked",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

/// Why a waiver was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaiverReason {
    EmergencyHotfix,
    LegacyIntegration,
    ExperimentalFeature,
    ThirdPartyConstraint,
    PerformanceCritical,
    SecurityPatch,
    InfrastructureLimitation,
    Other,
}

impl WaiverReason {
    pub const ALL: [WaiverReason; 8] = [
        WaiverReason::EmergencyHotfix,
        WaiverReason::LegacyIntegration,
        WaiverReason::ExperimentalFeature,
        WaiverReason::ThirdPartyConstraint,
        WaiverReason::PerformanceCritical,
        WaiverReason::SecurityPatch,
        WaiverReason::InfrastructureLimitation,
        WaiverReason::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WaiverReason::EmergencyHotfix => "emergency_hotfix",
            WaiverReason::LegacyIntegration => "legacy_integration",
            WaiverReason::ExperimentalFeature => "experimental_feature",
            WaiverReason::ThirdPartyConstraint => "third_party_constraint",
            WaiverReason::PerformanceCritical => "performance_critical",
            WaiverReason::SecurityPatch => "security_patch",
            WaiverReason::InfrastructureLimitation => "infrastructure_limitation",
            WaiverReason::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == raw)
    }
}

/// Budget increase granted by a waiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDelta {
    #[serde(default)]
    pub max_files: u32,
    #[serde(default)]
    pub max_loc: u32,
}

/// Exception record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waiver {
    /// Identifier, `WV-NNNN`
    pub id: String,

    pub title: String,

    pub reason: WaiverReason,

    pub status: WaiverStatus,

    /// Gates this waiver relaxes
    pub gates: Vec<String>,

    /// Who approved it
    pub approvers: Vec<String>,

    /// End of validity (exclusive)
    #[serde(deserialize_with = "timestamp")]
    pub expires_at: DateTime<Utc>,

    /// Budget increase, only honoured for the budget gate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<BudgetDelta>,

    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Waiver {
    /// Whether this waiver relaxes `gate`
    pub fn covers_gate(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Decide whether the waiver is effective for `gate` at `now`.
    ///
    /// Effective means: status is active, `now < expires_at`, enough
    /// approvers, and the gate is covered. The first failing condition is
    /// reported.
    pub fn eligibility(
        &self,
        gate: &str,
        required_approvers: u32,
        now: DateTime<Utc>,
    ) -> WaiverEligibility {
        match self.status {
            WaiverStatus::Revoked => return WaiverEligibility::Revoked,
            WaiverStatus::Expired => return WaiverEligibility::MarkedExpired,
            WaiverStatus::Active => {}
        }

        if now >= self.expires_at {
            return WaiverEligibility::Lapsed {
                expired_at: self.expires_at,
            };
        }

        let have = u32::try_from(self.approvers.len()).unwrap_or(u32::MAX);
        if have < required_approvers {
            return WaiverEligibility::InsufficientApprovals {
                have,
                need: required_approvers,
            };
        }

        if !self.covers_gate(gate) {
            return WaiverEligibility::GateNotCovered {
                gate: gate.to_string(),
            };
        }

        WaiverEligibility::Effective
    }

    pub fn is_effective_for(
        &self,
        gate: &str,
        required_approvers: u32,
        now: DateTime<Utc>,
    ) -> bool {
        self.eligibility(gate, required_approvers, now).is_effective()
    }

    /// Lifetime in whole days, when the creation time is known
    pub fn lifetime_days(&self) -> Option<i64> {
        self.created_at
            .map(|created| (self.expires_at - created).num_days())
    }

    /// Granted delta, zero when the document has none
    pub fn delta_or_zero(&self) -> BudgetDelta {
        self.delta.unwrap_or_default()
    }
}

/// Outcome of checking a waiver against a gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WaiverEligibility {
    Effective,
    Revoked,
    /// Status field says `expired`
    MarkedExpired,
    /// Status is active but `expires_at` has passed
    Lapsed { expired_at: DateTime<Utc> },
    InsufficientApprovals { have: u32, need: u32 },
    GateNotCovered { gate: String },
}

impl WaiverEligibility {
    pub fn is_effective(&self) -> bool {
        matches!(self, Self::Effective)
    }

    /// Status, expiry and approval failures; a waiver for another gate is
    /// not a defect.
    pub fn is_defect(&self) -> bool {
        !matches!(self, Self::Effective | Self::GateNotCovered { .. })
    }

    /// One-line fix suggestion for a non-effective waiver
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Effective => "No action needed",
            Self::Revoked => "Remove the waiver from waiver_ids or request a new waiver",
            Self::MarkedExpired | Self::Lapsed { .. } => {
                "Renew the waiver with a new expires_at or remove it from waiver_ids"
            }
            Self::InsufficientApprovals { .. } => {
                "Collect the missing approvals and list them under approvers"
            }
            Self::GateNotCovered { .. } => "Add the gate to the waiver's gates list",
        }
    }
}

impl fmt::Display for WaiverEligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Effective => write!(f, "effective"),
            Self::Revoked => write!(f, "waiver has been revoked"),
            Self::MarkedExpired => write!(f, "waiver status is expired"),
            Self::Lapsed { expired_at } => {
                write!(f, "waiver expired at {}", expired_at.to_rfc3339())
            }
            Self::InsufficientApprovals { have, need } => {
                write!(f, "waiver has {have} approver(s), policy requires {need}")
            }
            Self::GateNotCovered { gate } => write!(f, "waiver does not cover gate {gate}"),
        }
    }
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn waiver(status: WaiverStatus, expires_in: Duration, approvers: usize) -> Waiver {
        let now = Utc::now();
        Waiver {
            id: "WV-0001".into(),
            title: "Legacy import path".into(),
            reason: WaiverReason::LegacyIntegration,
            status,
            gates: vec![BUDGET_LIMIT_GATE.into()],
            approvers: (0..approvers).map(|i| format!("approver-{i}")).collect(),
            expires_at: now + expires_in,
            delta: Some(BudgetDelta {
                max_files: 10,
                max_loc: 0,
            }),
            created_at: None,
            description: None,
        }
    }

    #[test]
    fn test_effective_waiver() {
        let w = waiver(WaiverStatus::Active, Duration::days(3), 1);
        assert!(w.is_effective_for(BUDGET_LIMIT_GATE, 1, Utc::now()));
    }

    #[test]
    fn test_status_checks_come_first() {
        let revoked = waiver(WaiverStatus::Revoked, Duration::days(3), 2);
        assert_eq!(
            revoked.eligibility(BUDGET_LIMIT_GATE, 1, Utc::now()),
            WaiverEligibility::Revoked
        );

        let expired = waiver(WaiverStatus::Expired, Duration::days(3), 2);
        assert_eq!(
            expired.eligibility(BUDGET_LIMIT_GATE, 1, Utc::now()),
            WaiverEligibility::MarkedExpired
        );
    }

    #[test]
    fn test_active_but_past_expiry_lapses() {
        let w = waiver(WaiverStatus::Active, -Duration::hours(1), 3);
        let result = w.eligibility(BUDGET_LIMIT_GATE, 1, Utc::now());
        assert!(matches!(result, WaiverEligibility::Lapsed { .. }));
        assert!(result.is_defect());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let w = waiver(WaiverStatus::Active, Duration::days(1), 1);
        let at_expiry = w.expires_at;
        assert!(!w.is_effective_for(BUDGET_LIMIT_GATE, 1, at_expiry));
        assert!(w.is_effective_for(
            BUDGET_LIMIT_GATE,
            1,
            at_expiry - Duration::seconds(1)
        ));
    }

    #[test]
    fn test_insufficient_approvals() {
        let w = waiver(WaiverStatus::Active, Duration::days(1), 1);
        assert_eq!(
            w.eligibility(BUDGET_LIMIT_GATE, 2, Utc::now()),
            WaiverEligibility::InsufficientApprovals { have: 1, need: 2 }
        );
    }

    #[test]
    fn test_gate_not_covered_is_not_a_defect() {
        let w = waiver(WaiverStatus::Active, Duration::days(1), 1);
        let result = w.eligibility("coverage_threshold", 1, Utc::now());
        assert!(matches!(result, WaiverEligibility::GateNotCovered { .. }));
        assert!(!result.is_defect());
    }

    #[test]
    fn test_deserialize_with_flexible_timestamps() {
        let value = json!({
            "id": "WV-0002",
            "title": "Hotfix",
            "reason": "emergency_hotfix",
            "status": "active",
            "gates": ["budget_limit"],
            "approvers": ["lead"],
            "expires_at": "2030-01-31",
            "created_at": "2030-01-01T00:00:00Z"
        });

        let w: Waiver = serde_json::from_value(value).unwrap();
        assert_eq!(w.reason, WaiverReason::EmergencyHotfix);
        assert_eq!(w.lifetime_days(), Some(30));
        assert_eq!(w.delta_or_zero(), BudgetDelta::default());
    }

    #[test]
    fn test_reason_and_status_parse() {
        assert_eq!(
            WaiverReason::parse("security_patch"),
            Some(WaiverReason::SecurityPatch)
        );
        assert!(WaiverReason::parse("because").is_none());
        assert_eq!(WaiverStatus::parse("revoked"), Some(WaiverStatus::Revoked));
        assert!(WaiverStatus::parse("paused").is_none());
    }
}
