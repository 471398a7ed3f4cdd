//! Spec validator

use crate::advisor::AutoFixAdvisor;
use crate::checks::{self, Findings};
use crate::error::Result;
use caws_types::{parse_document, DocumentFormat, Finding, Policy, ValidationResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Top-level fields every spec must carry
pub const REQUIRED_FIELDS: [&str; 7] = [
    "id",
    "title",
    "risk_tier",
    "mode",
    "scope",
    "invariants",
    "acceptance",
];

/// Characters that make a `scope.out` entry a glob
pub const GLOB_METACHARACTERS: [char; 7] = ['*', '?', '[', ']', '{', '}', '!'];

/// Options for a single validation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Embed auto-fix suggestions in the result. Nothing is applied.
    pub auto_fix_preview: bool,
}

/// Validates working specs against structural and tier rules
#[derive(Debug, Clone)]
pub struct SpecValidator {
    policy: Arc<Policy>,
    advisor: AutoFixAdvisor,
}

impl SpecValidator {
    /// Validator using the given policy's tier table
    pub fn new(policy: Arc<Policy>) -> Self {
        Self {
            policy,
            advisor: AutoFixAdvisor::new(),
        }
    }

    pub fn with_advisor(mut self, advisor: AutoFixAdvisor) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn policy(&self) -> &Arc<Policy> {
        &self.policy
    }

    /// Validate a spec document
    pub fn validate(&self, spec: &Value) -> ValidationResult {
        self.validate_with(spec, ValidateOptions::default())
    }

    pub fn validate_with(&self, spec: &Value, options: ValidateOptions) -> ValidationResult {
        let findings = self.collect(spec);
        let mut result = ValidationResult::from_findings(findings.errors, findings.warnings);

        if options.auto_fix_preview {
            result.auto_fixes = self.advisor.suggest_fixes(&result);
        }

        let spec_id = spec.get("id").and_then(|id| id.as_str()).unwrap_or("<none>");
        debug!(
            spec_id,
            passed = result.passed,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            score = result.compliance_score,
            "Spec validated"
        );

        result
    }

    /// Parse spec text and validate it
    pub fn validate_text(
        &self,
        text: &str,
        format: DocumentFormat,
        options: ValidateOptions,
    ) -> Result<ValidationResult> {
        let spec = parse_document(text, format)?;
        Ok(self.validate_with(&spec, options))
    }

    fn collect(&self, spec: &Value) -> Findings {
        let mut findings = Findings::default();

        let Some(root) = spec.as_object() else {
            findings.errors.push(Finding::structural(
                "spec.type",
                "$",
                "spec must be a mapping of fields",
                "Start from a spec template with id, title, risk_tier, mode, scope, invariants and acceptance",
            ));
            return findings;
        };

        checks::check_required(root, &REQUIRED_FIELDS, &mut findings);
        let tier = checks::check_risk_tier(root, &mut findings);
        checks::check_shapes(root, &mut findings);
        checks::check_cross_field(root, &GLOB_METACHARACTERS, &mut findings);

        // Tier rules depend on a valid tier.
        if let Some(tier) = tier {
            checks::check_tier_rules(root, tier, &self.policy, &mut findings);
        }
        checks::check_advisories(root, tier, &mut findings);

        findings
    }
}

impl Default for SpecValidator {
    fn default() -> Self {
        Self::new(Arc::new(Policy::default_policy()))
    }
}
