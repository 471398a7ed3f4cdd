//! Structural validation of policy documents
//!
//! Runs on the raw value tree so every violation carries the exact dotted
//! path an author has to edit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Threshold fields that must lie in [0, 100]
const THRESHOLD_FIELDS: [&str; 2] = ["coverage_threshold", "mutation_threshold"];

/// Flag fields that must be booleans
const FLAG_FIELDS: [&str; 2] = ["contracts_required", "manual_review_required"];

/// One structural problem in a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyViolation {
    /// Dotted path, e.g. `risk_tiers.2.max_loc`
    pub field: String,
    pub message: String,
}

impl PolicyViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a parsed policy document. An empty list means the document can be
/// deserialized into a `Policy`.
pub fn validate_policy_document(doc: &Value) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();

    let Some(root) = doc.as_object() else {
        violations.push(PolicyViolation::new("$", "policy must be a mapping"));
        return violations;
    };

    check_version(root, &mut violations);
    check_risk_tiers(root, &mut violations);
    check_waiver_approval(root, &mut violations);

    violations
}

fn check_version(root: &Map<String, Value>, out: &mut Vec<PolicyViolation>) {
    match root.get("version") {
        None | Some(Value::Null) => {
            out.push(PolicyViolation::new("version", "version is required"))
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            out.push(PolicyViolation::new("version", "version must not be empty"))
        }
        Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(_) => out.push(PolicyViolation::new(
            "version",
            "version must be a string or number",
        )),
    }
}

fn check_risk_tiers(root: &Map<String, Value>, out: &mut Vec<PolicyViolation>) {
    let tiers = match root.get("risk_tiers") {
        Some(Value::Object(tiers)) => tiers,
        None | Some(Value::Null) => {
            out.push(PolicyViolation::new("risk_tiers", "risk_tiers is required"));
            return;
        }
        Some(_) => {
            out.push(PolicyViolation::new(
                "risk_tiers",
                "risk_tiers must be a mapping from tier (1-3) to settings",
            ));
            return;
        }
    };

    if tiers.is_empty() {
        out.push(PolicyViolation::new(
            "risk_tiers",
            "risk_tiers must declare at least one tier",
        ));
    }

    for (key, entry) in tiers {
        let base = format!("risk_tiers.{key}");
        if !matches!(key.as_str(), "1" | "2" | "3") {
            out.push(PolicyViolation::new(&base, "tier key must be 1, 2 or 3"));
            continue;
        }

        let Some(entry) = entry.as_object() else {
            out.push(PolicyViolation::new(&base, "tier settings must be a mapping"));
            continue;
        };

        for field in ["max_files", "max_loc"] {
            let path = format!("{base}.{field}");
            match entry.get(field) {
                None | Some(Value::Null) => {
                    out.push(PolicyViolation::new(path, format!("{field} is required")))
                }
                Some(v) if !is_positive_u32(v) => out.push(PolicyViolation::new(
                    path,
                    format!("{field} must be a positive integer"),
                )),
                Some(_) => {}
            }
        }

        for field in THRESHOLD_FIELDS {
            if let Some(v) = entry.get(field).filter(|v| !v.is_null()) {
                let in_range = v.as_f64().is_some_and(|t| (0.0..=100.0).contains(&t));
                if !in_range {
                    out.push(PolicyViolation::new(
                        format!("{base}.{field}"),
                        format!("{field} must be a number between 0 and 100"),
                    ));
                }
            }
        }

        for field in FLAG_FIELDS {
            if let Some(v) = entry.get(field).filter(|v| !v.is_null()) {
                if !v.is_boolean() {
                    out.push(PolicyViolation::new(
                        format!("{base}.{field}"),
                        format!("{field} must be true or false"),
                    ));
                }
            }
        }
    }
}

fn check_waiver_approval(root: &Map<String, Value>, out: &mut Vec<PolicyViolation>) {
    let approval = match root.get("waiver_approval") {
        None | Some(Value::Null) => return,
        Some(Value::Object(approval)) => approval,
        Some(_) => {
            out.push(PolicyViolation::new(
                "waiver_approval",
                "waiver_approval must be a mapping",
            ));
            return;
        }
    };

    for field in ["required_approvers", "max_duration_days"] {
        if let Some(v) = approval.get(field).filter(|v| !v.is_null()) {
            if !is_positive_u32(v) {
                out.push(PolicyViolation::new(
                    format!("waiver_approval.{field}"),
                    format!("{field} must be a positive integer"),
                ));
            }
        }
    }
}

fn is_positive_u32(value: &Value) -> bool {
    value
        .as_u64()
        .is_some_and(|n| n > 0 && n <= u64::from(u32::MAX))
}
