//! Budget utilization

use caws_types::{Budget, LimitNotice, Utilization};
use serde::{Deserialize, Serialize};

/// Size of a change, as reported by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub files: u64,
    pub loc: u64,
}

impl ChangeStats {
    pub fn new(files: u64, loc: u64) -> Self {
        Self { files, loc }
    }
}

/// Percent of `budget` used by a change.
///
/// Each dimension is `actual * 100 / limit`, not clamped, so over-budget
/// work reports more than 100. A zero limit counts as 1. `overall_pct` is
/// the larger of the two dimensions: whichever runs out first binds.
pub fn calculate_budget_utilization(
    actual_files: u64,
    actual_loc: u64,
    budget: &Budget,
) -> Utilization {
    let files_pct = percent(actual_files, budget.max_files);
    let loc_pct = percent(actual_loc, budget.max_loc);
    Utilization {
        files_pct,
        loc_pct,
        overall_pct: files_pct.max(loc_pct),
    }
}

/// Highest notice the utilization has reached
pub fn is_approaching_limit(utilization: &Utilization) -> LimitNotice {
    LimitNotice::from_pct(utilization.overall_pct)
}

fn percent(actual: u64, limit: u32) -> f64 {
    // Multiply first: `actual * 100` and `limit` are exact in f64 for any
    // realistic change, so round figures stay round.
    (actual as f64 * 100.0) / f64::from(limit.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_bound_utilization() {
        let u = calculate_budget_utilization(45, 5200, &Budget::new(100, 10_000));
        assert_eq!(u.files_pct, 45.0);
        assert_eq!(u.loc_pct, 52.0);
        assert_eq!(u.overall_pct, 52.0);
    }

    #[test]
    fn test_files_bound_utilization() {
        let u = calculate_budget_utilization(46, 300, &Budget::new(50, 2000));
        assert_eq!(u.files_pct, 92.0);
        assert_eq!(u.loc_pct, 15.0);
        assert_eq!(u.overall_pct, 92.0);
        assert_eq!(is_approaching_limit(&u), LimitNotice::Warning);
    }

    #[test]
    fn test_over_budget_not_clamped() {
        let u = calculate_budget_utilization(30, 3000, &Budget::new(25, 1000));
        assert_eq!(u.files_pct, 120.0);
        assert_eq!(u.loc_pct, 300.0);
        assert!(u.exceeds_budget());
        assert_eq!(is_approaching_limit(&u), LimitNotice::Critical);
    }

    #[test]
    fn test_zero_limit_counts_as_one() {
        let u = calculate_budget_utilization(2, 0, &Budget::new(0, 0));
        assert_eq!(u.files_pct, 200.0);
        assert_eq!(u.loc_pct, 0.0);
    }

    #[test]
    fn test_notice_tiers() {
        let budget = Budget::new(100, 1000);
        let at = |files| is_approaching_limit(&calculate_budget_utilization(files, 0, &budget));
        assert_eq!(at(79), LimitNotice::None);
        assert_eq!(at(80), LimitNotice::Notice);
        assert_eq!(at(90), LimitNotice::Warning);
        assert_eq!(at(95), LimitNotice::Critical);
    }
}
