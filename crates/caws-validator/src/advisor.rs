//! Auto-fix advisor
//!
//! Turns findings into concrete proposed values. The advisor only reads the
//! validation result; the offending values it needs travel in
//! `Finding::observed`. Suggestions are never applied here. [`apply_fixes`]
//! produces a patched copy for callers that choose to accept them.

use crate::path::set_path;
use caws_types::{
    is_valid_spec_id, AutoFix, ContractType, Finding, RiskTier, SpecMode, ValidationResult,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::debug;

/// Proposes structured corrections for validation findings
#[derive(Debug, Clone)]
pub struct AutoFixAdvisor {
    fallback_mode: SpecMode,
}

impl AutoFixAdvisor {
    pub fn new() -> Self {
        Self {
            fallback_mode: SpecMode::Feature,
        }
    }

    /// Mode proposed when a spec's mode is missing or unknown
    pub fn with_fallback_mode(mut self, mode: SpecMode) -> Self {
        self.fallback_mode = mode;
        self
    }

    /// Suggest fixes for the findings in `result`. Pure: the result is not
    /// modified and no document is touched.
    pub fn suggest_fixes(&self, result: &ValidationResult) -> Vec<AutoFix> {
        let mut claimed_ids = HashSet::new();
        result
            .errors
            .iter()
            .chain(result.warnings.iter())
            .filter_map(|finding| self.fix_for(finding, &mut claimed_ids))
            .collect()
    }

    fn fix_for(&self, finding: &Finding, claimed_ids: &mut HashSet<String>) -> Option<AutoFix> {
        let observed = finding.observed.as_ref();
        match finding.code.as_str() {
            "risk_tier.out_of_range" | "risk_tier.type" => {
                let level = observed.and_then(numeric_level)?;
                let tier = RiskTier::clamp_level(level);
                Some(fix(
                    finding,
                    format!("Set risk_tier to {} (nearest valid tier)", tier.level()),
                    json!(tier.level()),
                ))
            }
            "mode.invalid" => {
                let mode = observed
                    .and_then(Value::as_str)
                    .and_then(|raw| SpecMode::parse(&raw.trim().to_ascii_lowercase()))
                    .unwrap_or(self.fallback_mode);
                Some(fix(finding, format!("Set mode to '{mode}'"), json!(mode.as_str())))
            }
            "required.missing" if finding.field == "mode" => Some(fix(
                finding,
                format!("Add mode '{}'", self.fallback_mode),
                json!(self.fallback_mode.as_str()),
            )),
            "id.format" => {
                let normalized = observed
                    .and_then(Value::as_str)
                    .map(|raw| raw.trim().to_ascii_uppercase().replace(['_', ' '], "-"))
                    .filter(|id| is_valid_spec_id(id))?;
                Some(fix(finding, format!("Rename id to '{normalized}'"), json!(normalized)))
            }
            "scope.out.glob" => {
                let raw = observed.and_then(Value::as_str)?;
                let literal = literal_prefix(raw)?;
                Some(fix(
                    finding,
                    format!("Replace '{raw}' with the literal path '{literal}'"),
                    json!(literal),
                ))
            }
            "scope.in.absolute" => {
                let raw = observed.and_then(Value::as_str)?;
                let relative = raw.trim_start_matches('/');
                if relative.is_empty() {
                    return None;
                }
                Some(fix(
                    finding,
                    format!("Make '{raw}' relative to the project root"),
                    json!(relative),
                ))
            }
            "acceptance.duplicate_id" => {
                let observed = observed?;
                let duplicate = observed.get("id").and_then(Value::as_str)?;
                let taken: HashSet<&str> = observed
                    .get("existing")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                let next = next_free_id(duplicate, &taken, claimed_ids);
                claimed_ids.insert(next.clone());
                Some(fix(
                    finding,
                    format!("Renumber duplicate acceptance id '{duplicate}' to '{next}'"),
                    json!(next),
                ))
            }
            "contracts.type_invalid" => {
                let contract_type = observed
                    .and_then(Value::as_str)
                    .and_then(|raw| ContractType::parse(&raw.trim().to_ascii_lowercase()))
                    .unwrap_or(ContractType::Openapi);
                Some(fix(
                    finding,
                    format!("Set contract type to '{}'", contract_type.as_str()),
                    json!(contract_type.as_str()),
                ))
            }
            "contracts.required" => Some(fix(
                finding,
                "Add an OpenAPI contract placeholder",
                json!([{ "type": "openapi", "path": "docs/api/openapi.yaml" }]),
            )),
            "tier1.observability_missing" => Some(fix(
                finding,
                "Add an observability template",
                json!({
                    "logs": ["<event logged when the change runs>"],
                    "metrics": ["<metric that shows the change is healthy>"],
                    "traces": ["<span covering the changed path>"]
                }),
            )),
            "tier1.rollback_missing" => Some(fix(
                finding,
                "Add a rollback template",
                json!(["<steps that revert this change safely>"]),
            )),
            "tier1.security_missing" => Some(fix(
                finding,
                "Add a security requirements template",
                json!(["<security requirement this change must meet>"]),
            )),
            _ => None,
        }
    }
}

impl Default for AutoFixAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

fn fix(finding: &Finding, description: impl Into<String>, proposed_value: Value) -> AutoFix {
    AutoFix {
        field: finding.field.clone(),
        description: description.into(),
        reason: finding.message.clone(),
        proposed_value,
    }
}

/// Integer tier level from an observed value, if it is numeric at all
fn numeric_level(value: &Value) -> Option<i64> {
    if let Some(level) = value.as_i64() {
        return Some(level);
    }
    let float = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    // Saturating float-to-int cast; NaN is rejected by `is_finite`.
    float.is_finite().then(|| float.round() as i64)
}

/// Path up to the first glob metacharacter, without a trailing slash
fn literal_prefix(pattern: &str) -> Option<String> {
    let end = pattern
        .find(&crate::validator::GLOB_METACHARACTERS[..])
        .unwrap_or(pattern.len());
    let literal = pattern[..end].trim_end_matches('/');
    (!literal.is_empty()).then(|| literal.to_string())
}

/// First `<prefix><n>` not used by the spec or an earlier suggestion
fn next_free_id(duplicate: &str, taken: &HashSet<&str>, claimed: &HashSet<String>) -> String {
    let prefix = duplicate.trim_end_matches(|c: char| c.is_ascii_digit());
    let prefix = if prefix.is_empty() { "A" } else { prefix };
    (1usize..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()) && !claimed.contains(candidate))
        .unwrap_or_else(|| format!("{duplicate}-dup"))
}

/// Copy of `spec` with every fix applied. Fixes whose field path cannot be
/// written are skipped.
pub fn apply_fixes(spec: &Value, fixes: &[AutoFix]) -> Value {
    let mut patched = spec.clone();
    for fix in fixes {
        if !set_path(&mut patched, &fix.field, fix.proposed_value.clone()) {
            debug!(field = %fix.field, "Auto-fix target not writable, skipped");
        }
    }
    patched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::SpecValidator;

    fn finding(code: &str, field: &str, observed: Value) -> Finding {
        Finding::structural(code, field, "msg", "hint").with_observed(observed)
    }

    fn only_fix(finding: Finding) -> Option<AutoFix> {
        let result = ValidationResult::from_findings(vec![finding], Vec::new());
        AutoFixAdvisor::new().suggest_fixes(&result).into_iter().next()
    }

    #[test]
    fn test_risk_tier_clamps_to_nearest_bound() {
        for (observed, expected) in [
            (json!(0), 1),
            (json!(-4), 1),
            (json!(4), 3),
            (json!(99), 3),
            (json!(2.4), 2),
            (json!("3"), 3),
        ] {
            let fix = only_fix(finding("risk_tier.out_of_range", "risk_tier", observed)).unwrap();
            assert_eq!(fix.proposed_value, json!(expected));
        }
        assert!(only_fix(finding("risk_tier.type", "risk_tier", json!("high"))).is_none());
    }

    #[test]
    fn test_mode_fix_prefers_case_insensitive_match() {
        let fix = only_fix(finding("mode.invalid", "mode", json!("Refactor"))).unwrap();
        assert_eq!(fix.proposed_value, json!("refactor"));

        let fix = only_fix(finding("mode.invalid", "mode", json!("rewrite"))).unwrap();
        assert_eq!(fix.proposed_value, json!("feature"));
    }

    #[test]
    fn test_scope_out_glob_becomes_literal_prefix() {
        let glob = finding("scope.out.glob", "scope.out[0]", json!("src/legacy/**"));
        let fix = only_fix(glob).unwrap();
        assert_eq!(fix.proposed_value, json!("src/legacy"));
        let no_prefix = finding("scope.out.glob", "scope.out[0]", json!("**/*.gen.ts"));
        assert!(only_fix(no_prefix).is_none());
    }

    #[test]
    fn test_spec_id_uppercased() {
        let fix = only_fix(finding("id.format", "id", json!("feat_0012"))).unwrap();
        assert_eq!(fix.proposed_value, json!("FEAT-0012"));
        assert!(only_fix(finding("id.format", "id", json!("no digits"))).is_none());
    }

    #[test]
    fn test_duplicate_ids_get_distinct_replacements() {
        let existing = json!({ "id": "A1", "existing": ["A1", "A2", "A1", "A1"] });
        let result = ValidationResult::from_findings(
            vec![
                finding("acceptance.duplicate_id", "acceptance[2].id", existing.clone()),
                finding("acceptance.duplicate_id", "acceptance[3].id", existing),
            ],
            Vec::new(),
        );
        let values: Vec<_> = AutoFixAdvisor::new()
            .suggest_fixes(&result)
            .into_iter()
            .map(|f| f.proposed_value)
            .collect();
        assert_eq!(values, vec![json!("A3"), json!("A4")]);
    }

    #[test]
    fn test_suggest_fixes_is_pure() {
        let result = ValidationResult::from_findings(
            vec![finding("mode.invalid", "mode", json!("x"))],
            Vec::new(),
        );
        let before = result.clone();
        let first = AutoFixAdvisor::new().suggest_fixes(&result);
        let second = AutoFixAdvisor::new().suggest_fixes(&result);
        assert_eq!(result, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_applied_fixes_clear_the_errors() {
        let spec = json!({
            "id": "feat-0007",
            "title": "Rotate API signing keys",
            "risk_tier": 9,
            "mode": "Chore",
            "scope": { "in": ["src/keys/"], "out": ["src/keys/legacy/*"] },
            "invariants": ["Old signatures verify until rotation completes"],
            "acceptance": [
                { "id": "A1", "given": "a key", "when": "rotated", "then": "new key signs" },
                { "id": "A1", "given": "old sig", "when": "verified", "then": "still valid" }
            ],
            "non_functional": { "security": ["keys never logged"] }
        });

        let validator = SpecValidator::default();
        let before = validator.validate(&spec);
        assert!(!before.passed);

        let fixes = AutoFixAdvisor::new().suggest_fixes(&before);
        let patched = apply_fixes(&spec, &fixes);
        let after = validator.validate(&patched);

        assert!(after.passed, "{:?}", after.errors);
        assert_eq!(patched["risk_tier"], json!(3));
        assert_eq!(patched["mode"], json!("chore"));
        assert_eq!(patched["id"], json!("FEAT-0007"));
        assert_eq!(patched["scope"]["out"][0], json!("src/keys/legacy"));
        assert_eq!(patched["acceptance"][1]["id"], json!("A2"));
        // Input untouched.
        assert_eq!(spec["risk_tier"], json!(9));
    }
}
