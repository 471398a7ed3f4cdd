//! Error types for policy loading

use crate::validate::PolicyViolation;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a policy file that exists cannot be used
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    /// File exists but could not be read
    #[error("cannot read policy {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// File is not valid YAML/JSON
    #[error("cannot parse policy {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// File parsed but violates the policy schema
    #[error("invalid policy {}: {}", .path.display(), summarize(.violations))]
    Invalid {
        path: PathBuf,
        violations: Vec<PolicyViolation>,
    },
}

impl PolicyError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Unreadable { path, .. }
            | Self::Parse { path, .. }
            | Self::Invalid { path, .. } => {
                path
            }
        }
    }

    /// Stable machine code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreadable { .. } => "policy.unreadable",
            Self::Parse { .. } => "policy.parse_error",
            Self::Invalid { .. } => "policy.invalid",
        }
    }

    /// Structural violations, empty for read/parse failures
    pub fn violations(&self) -> &[PolicyViolation] {
        match self {
            Self::Invalid { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn summarize(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message_names_path_and_field() {
        let err = PolicyError::Invalid {
            path: PathBuf::from(".caws/policy.yaml"),
            violations: vec![PolicyViolation::new(
                "risk_tiers.2.max_loc",
                "must be a positive integer",
            )],
        };
        let msg = err.to_string();
        assert!(msg.contains(".caws/policy.yaml"));
        assert!(msg.contains("risk_tiers.2.max_loc"));
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.code(), "policy.invalid");
    }
}
