//! Compliance scoring
//!
//! score = max(0, 1 - 0.2 x errors - 0.1 x warnings), computed in whole
//! tenths so that e.g. two errors and one warning give exactly 0.5.

use serde::{Deserialize, Serialize};
use std::fmt;

const ERROR_PENALTY_TENTHS: usize = 2;
const WARNING_PENALTY_TENTHS: usize = 1;

/// Compliance score in [0, 1]
pub fn compliance_score(errors: usize, warnings: usize) -> f64 {
    let penalty = errors
        .saturating_mul(ERROR_PENALTY_TENTHS)
        .saturating_add(warnings.saturating_mul(WARNING_PENALTY_TENTHS));
    let remaining = 10usize.saturating_sub(penalty);
    remaining as f64 / 10.0
}

/// Letter grade for a compliance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplianceGrade {
    A,
    B,
    C,
    D,
    F,
}

impl ComplianceGrade {
    /// >= 0.9 A, >= 0.8 B, >= 0.7 C, >= 0.6 D, else F
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ComplianceGrade::A
        } else if score >= 0.8 {
            ComplianceGrade::B
        } else if score >= 0.7 {
            ComplianceGrade::C
        } else if score >= 0.6 {
            ComplianceGrade::D
        } else {
            ComplianceGrade::F
        }
    }
}

impl fmt::Display for ComplianceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            ComplianceGrade::A => "A",
            ComplianceGrade::B => "B",
            ComplianceGrade::C => "C",
            ComplianceGrade::D => "D",
            ComplianceGrade::F => "F",
        };
        f.write_str(letter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_exact_in_tenths() {
        assert_eq!(compliance_score(0, 0), 1.0);
        assert_eq!(compliance_score(2, 1), 0.5);
        assert_eq!(compliance_score(1, 1), 0.7);
        assert_eq!(compliance_score(0, 3), 0.7);
    }

    #[test]
    fn test_score_floors_at_zero() {
        assert_eq!(compliance_score(5, 0), 0.0);
        assert_eq!(compliance_score(9, 9), 0.0);
        assert_eq!(compliance_score(usize::MAX, usize::MAX), 0.0);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(ComplianceGrade::from_score(1.0), ComplianceGrade::A);
        assert_eq!(ComplianceGrade::from_score(0.9), ComplianceGrade::A);
        assert_eq!(ComplianceGrade::from_score(0.8), ComplianceGrade::B);
        assert_eq!(ComplianceGrade::from_score(0.7), ComplianceGrade::C);
        assert_eq!(ComplianceGrade::from_score(0.6), ComplianceGrade::D);
        assert_eq!(ComplianceGrade::from_score(0.5), ComplianceGrade::F);
        assert_eq!(ComplianceGrade::from_score(0.0), ComplianceGrade::F);
    }

    #[test]
    fn test_two_errors_one_warning() {
        let score = compliance_score(2, 1);
        assert_eq!(score, 0.5);
        assert_eq!(ComplianceGrade::from_score(score), ComplianceGrade::F);
    }
}
