//! Validation results
//!
//! `ValidationResult` is the contract the CLI and agent-facing layers
//! depend on. It serializes to a flat JSON object with `passed`, `errors`,
//! `warnings`, `complianceScore`, `autoFixes` and, when budgets were
//! requested, `budget`. Field names are stable across versions.

use crate::budget::BudgetResult;
use crate::score::{compliance_score, ComplianceGrade};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of a finding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Missing or malformed required field
    #[default]
    Structural,
    /// Tier-specific requirement unmet
    BusinessRule,
    /// Policy document missing or malformed
    Policy,
    /// Waiver not usable
    Waiver,
    /// Budget consumption
    Budget,
}

/// A single error or warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Dotted path of the offending field, e.g. `scope.out[1]`
    pub field: String,

    pub message: String,

    /// One-line fix suggestion
    pub suggestion: String,

    #[serde(default)]
    pub kind: FindingKind,

    /// Stable machine code, e.g. `risk_tier.out_of_range`
    #[serde(default)]
    pub code: String,

    /// Offending value, when it helps a fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<Value>,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: suggestion.into(),
            kind,
            code: code.into(),
            observed: None,
        }
    }

    pub fn structural(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::new(FindingKind::Structural, code, field, message, suggestion)
    }

    pub fn business_rule(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::new(FindingKind::BusinessRule, code, field, message, suggestion)
    }

    /// Attach the offending value
    pub fn with_observed(mut self, observed: Value) -> Self {
        self.observed = Some(observed);
        self
    }
}

/// A proposed correction. Never applied by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFix {
    pub field: String,
    pub description: String,
    pub reason: String,
    pub proposed_value: Value,
}

/// Verdict returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub passed: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub compliance_score: f64,
    #[serde(default)]
    pub auto_fixes: Vec<AutoFix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetResult>,
}

impl ValidationResult {
    /// Build a finalized result from findings
    pub fn from_findings(errors: Vec<Finding>, warnings: Vec<Finding>) -> Self {
        let mut result = Self {
            passed: true,
            errors,
            warnings,
            compliance_score: 1.0,
            auto_fixes: Vec::new(),
            budget: None,
        };
        result.finalize();
        result
    }

    pub fn push_error(&mut self, finding: Finding) {
        self.errors.push(finding);
        self.finalize();
    }

    pub fn push_warning(&mut self, finding: Finding) {
        self.warnings.push(finding);
        self.finalize();
    }

    /// Recompute `passed` and `compliance_score` from the findings
    pub fn finalize(&mut self) {
        self.passed = self.errors.is_empty();
        self.compliance_score = compliance_score(self.errors.len(), self.warnings.len());
    }

    pub fn grade(&self) -> ComplianceGrade {
        ComplianceGrade::from_score(self.compliance_score)
    }

    /// Errors with the given code
    pub fn errors_with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.errors.iter().filter(move |f| f.code == code)
    }

    /// Whether any error or warning names `field`
    pub fn mentions_field(&self, field: &str) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|f| f.field == field)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::from_findings(Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(field: &str) -> Finding {
        Finding::structural("test.error", field, "broken", "fix it")
    }

    #[test]
    fn test_empty_result_passes() {
        let result = ValidationResult::default();
        assert!(result.passed);
        assert_eq!(result.compliance_score, 1.0);
        assert_eq!(result.grade(), ComplianceGrade::A);
    }

    #[test]
    fn test_push_error_fails_result() {
        let mut result = ValidationResult::default();
        result.push_error(error("title"));
        assert!(!result.passed);
        assert_eq!(result.compliance_score, 0.8);
        assert!(result.mentions_field("title"));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut result = ValidationResult::default();
        result.push_warning(error("title"));
        assert!(result.passed);
        assert_eq!(result.compliance_score, 0.9);
    }

    #[test]
    fn test_flat_json_shape() {
        let result = ValidationResult::from_findings(vec![error("id")], Vec::new());
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["passed"], false);
        assert_eq!(obj["errors"][0]["field"], "id");
        assert_eq!(obj["errors"][0]["suggestion"], "fix it");
        assert_eq!(obj["complianceScore"], 0.8);
        assert!(obj.contains_key("warnings"));
        assert!(obj.contains_key("autoFixes"));
        assert!(!obj.contains_key("budget"));
        assert!(!obj["errors"][0].as_object().unwrap().contains_key("observed"));
    }

    #[test]
    fn test_errors_with_code() {
        let result = ValidationResult::from_findings(
            vec![error("a"), Finding::structural("other", "b", "m", "s")],
            Vec::new(),
        );
        assert_eq!(result.errors_with_code("test.error").count(), 1);
    }
}
