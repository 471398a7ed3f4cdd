//! Error types for waiver loading

use crate::validate::WaiverViolation;
use caws_types::{Finding, FindingKind};
use std::path::PathBuf;
use thiserror::Error;

/// Why a waiver could not be loaded
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaiverLoadError {
    #[error("waiver {id} not found")]
    NotFound { id: String },

    #[error("cannot read waiver {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("cannot parse waiver {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid waiver {id}: {}", summarize(.violations))]
    Invalid {
        id: String,
        violations: Vec<WaiverViolation>,
    },

    /// Id in the document body differs from the one it was loaded by
    #[error("waiver file for {expected} declares id {found}")]
    IdMismatch { expected: String, found: String },
}

impl WaiverLoadError {
    /// Stable machine code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "waiver.not_found",
            Self::Unreadable { .. } => "waiver.unreadable",
            Self::Parse { .. } => "waiver.parse_error",
            Self::Invalid { .. } => "waiver.invalid",
            Self::IdMismatch { .. } => "waiver.id_mismatch",
        }
    }

    pub fn suggestion(&self) -> String {
        match self {
            Self::NotFound { id } => {
                format!("Create the waiver file for {id} or remove it from waiver_ids")
            }
            Self::Unreadable { path, .. } => {
                format!("Check the permissions of {}", path.display())
            }
            Self::Parse { path, .. } => format!("Fix the YAML/JSON syntax in {}", path.display()),
            Self::Invalid { violations, .. } => match violations.first() {
                Some(v) => format!("Fix waiver field {}", v.field),
                None => "Fix the waiver document".to_string(),
            },
            Self::IdMismatch { expected, .. } => {
                format!("Set id to {expected} or rename the file to match the id")
            }
        }
    }

    /// Warning surfaced to the caller for a skipped waiver
    pub fn to_finding(&self) -> Finding {
        Finding::new(
            FindingKind::Waiver,
            self.code(),
            "waiver_ids",
            self.to_string(),
            self.suggestion(),
        )
    }
}

fn summarize(violations: &[WaiverViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for waiver loading
pub type Result<T> = std::result::Result<T, WaiverLoadError>;
