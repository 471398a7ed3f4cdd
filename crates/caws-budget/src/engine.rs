//! Budget derivation

use crate::utilization::{calculate_budget_utilization, is_approaching_limit, ChangeStats};
use caws_types::{
    AppliedWaiver, BudgetResult, Finding, FindingKind, LimitNotice, Policy, RiskTier, Waiver,
    WaiverEligibility, WorkingSpec, BUDGET_LIMIT_GATE,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Findings produced by checking a change against its budget
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageFindings {
    /// Set when the change exceeds the effective budget
    pub overrun: Option<Finding>,
    /// Set when utilization reached the warning or critical notice
    pub approaching: Option<Finding>,
}

/// Combines policy, tier and waivers into an effective budget
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetEngine;

impl BudgetEngine {
    pub fn new() -> Self {
        Self
    }

    /// Derive the budget for a spec at the current time
    pub fn derive_budget(
        &self,
        spec: &WorkingSpec,
        policy: &Policy,
        waivers: &[Waiver],
    ) -> BudgetResult {
        self.derive_budget_at(spec.risk_tier, policy, waivers, Utc::now())
    }

    /// Derive the budget for a tier as of `now`.
    ///
    /// Starts from the policy tier baseline and adds the delta of every
    /// waiver that is effective for `budget_limit`. Waivers that fail on
    /// status, expiry or approvals produce a warning naming the reason;
    /// waivers for other gates are skipped quietly.
    pub fn derive_budget_at(
        &self,
        tier: RiskTier,
        policy: &Policy,
        waivers: &[Waiver],
        now: DateTime<Utc>,
    ) -> BudgetResult {
        let mut warnings = Vec::new();

        let baseline = match policy.tier(tier) {
            Some(settings) => settings.baseline(),
            None => {
                let baseline = Policy::builtin_baseline(tier);
                warn!(
                    tier = tier.level(),
                    budget = %baseline,
                    "Policy has no entry for tier, using built-in budget"
                );
                warnings.push(Finding::new(
                    FindingKind::Policy,
                    "policy.tier_missing",
                    format!("risk_tiers.{}", tier.level()),
                    format!("Policy declares no budget for {tier}; using built-in {baseline}"),
                    format!("Add risk_tiers.{} to the policy", tier.level()),
                ));
                baseline
            }
        };

        let required_approvers = policy.required_approvers();
        let max_duration = policy.max_waiver_duration_days();

        let mut effective = baseline;
        let mut applied = Vec::new();
        let mut seen = HashSet::new();

        for waiver in waivers {
            if !seen.insert(waiver.id.as_str()) {
                debug!(waiver_id = %waiver.id, "Duplicate waiver ignored");
                continue;
            }

            if let (Some(max_days), Some(lifetime)) = (max_duration, waiver.lifetime_days()) {
                if lifetime > i64::from(max_days) {
                    warnings.push(Finding::new(
                        FindingKind::Waiver,
                        "waiver.duration_exceeded",
                        "waiver_ids",
                        format!(
                            "Waiver {} runs {lifetime} days, policy allows at most {max_days}",
                            waiver.id
                        ),
                        "Shorten the waiver or split it into renewals within the policy limit",
                    ));
                }
            }

            match waiver.eligibility(BUDGET_LIMIT_GATE, required_approvers, now) {
                WaiverEligibility::Effective => {
                    let delta = waiver.delta_or_zero();
                    effective = effective.with_delta(delta);
                    debug!(
                        waiver_id = %waiver.id,
                        delta_files = delta.max_files,
                        delta_loc = delta.max_loc,
                        "Waiver applied to budget"
                    );
                    applied.push(AppliedWaiver {
                        id: waiver.id.clone(),
                        delta,
                    });
                }
                WaiverEligibility::GateNotCovered { .. } => {
                    debug!(waiver_id = %waiver.id, "Waiver does not cover budget_limit, skipped");
                }
                defect => {
                    warn!(
                        waiver_id = %waiver.id,
                        reason = %defect,
                        "Waiver not effective, skipped"
                    );
                    warnings.push(Finding::new(
                        FindingKind::Waiver,
                        defect_code(&defect),
                        "waiver_ids",
                        format!("Waiver {} not applied: {defect}", waiver.id),
                        defect.suggestion(),
                    ));
                }
            }
        }

        info!(
            tier = tier.level(),
            max_files = effective.max_files,
            max_loc = effective.max_loc,
            applied_waivers = applied.len(),
            "Budget derived"
        );

        BudgetResult {
            tier,
            baseline,
            effective,
            applied_waivers: applied,
            warnings,
            utilization: None,
            limit_notice: LimitNotice::None,
        }
    }

    /// Attach utilization for `stats` to `result` and report overruns and
    /// notices at warning level or above.
    pub fn check_usage(&self, result: &mut BudgetResult, stats: ChangeStats) -> UsageFindings {
        let utilization = calculate_budget_utilization(stats.files, stats.loc, &result.effective);
        let notice = is_approaching_limit(&utilization);
        result.utilization = Some(utilization);
        result.limit_notice = notice;

        let mut findings = UsageFindings::default();

        if utilization.exceeds_budget() {
            findings.overrun = Some(
                Finding::new(
                    FindingKind::Budget,
                    "budget.exceeded",
                    "budget",
                    format!(
                        "Change of {} files / {} LOC exceeds the budget of {}",
                        stats.files, stats.loc, result.effective
                    ),
                    "Split the change, or request a budget_limit waiver with a delta",
                )
                .with_observed(json!({
                    "filesPct": utilization.files_pct,
                    "locPct": utilization.loc_pct,
                })),
            );
        } else if notice >= LimitNotice::Warning {
            findings.approaching = Some(Finding::new(
                FindingKind::Budget,
                "budget.approaching_limit",
                "budget",
                format!(
                    "Change uses {:.0}% of its budget ({} notice)",
                    utilization.overall_pct,
                    notice.as_str()
                ),
                "Keep remaining work small or split it into a follow-up spec",
            ));
        } else if notice == LimitNotice::Notice {
            debug!(overall_pct = utilization.overall_pct, "Budget notice reached");
        }

        findings
    }
}

fn defect_code(eligibility: &WaiverEligibility) -> &'static str {
    match eligibility {
        WaiverEligibility::Revoked => "waiver.revoked",
        WaiverEligibility::MarkedExpired | WaiverEligibility::Lapsed { .. } => "waiver.expired",
        WaiverEligibility::InsufficientApprovals { .. } => "waiver.insufficient_approvals",
        WaiverEligibility::Effective | WaiverEligibility::GateNotCovered { .. } => "waiver.skipped",
    }
}
