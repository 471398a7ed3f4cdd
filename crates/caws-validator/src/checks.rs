//! Individual spec checks
//!
//! Each check reads the raw document and appends findings. Field paths in
//! findings are the ones `path::set_path` understands, so the advisor can
//! aim fixes at them.

use caws_types::ids::SPEC_ID_FORMAT;
use caws_types::{
    is_valid_spec_id, is_valid_waiver_id, ContractType, Finding, FindingKind, Policy, RiskTier,
    SpecMode,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Titles shorter than this get an advisory warning
pub(crate) const MIN_TITLE_LEN: usize = 10;

#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl Findings {
    fn error(&mut self, finding: Finding) {
        self.errors.push(finding);
    }

    fn warn(&mut self, finding: Finding) {
        self.warnings.push(finding);
    }
}

fn missing_suggestion(field: &str) -> String {
    match field {
        "id" => format!("Add id in {SPEC_ID_FORMAT} format"),
        "title" => "Add a short descriptive title".to_string(),
        "risk_tier" => "Add risk_tier: 1 (critical), 2 (standard) or 3 (low)".to_string(),
        "mode" => format!("Add mode: one of {}", mode_names()),
        "scope" => "Add scope.in listing the paths this change may touch".to_string(),
        "invariants" => "List at least one invariant that must hold after the change".to_string(),
        "acceptance" => {
            "Add at least one acceptance criterion with id, given, when and then".to_string()
        }
        other => format!("Add {other}"),
    }
}

fn mode_names() -> String {
    SpecMode::ALL.map(SpecMode::as_str).join(", ")
}

fn contract_type_names() -> String {
    ContractType::ALL.map(ContractType::as_str).join(", ")
}

fn is_present(root: &Map<String, Value>, field: &str) -> bool {
    root.get(field).is_some_and(|v| !v.is_null())
}

/// (a) Required top-level fields
pub(crate) fn check_required(root: &Map<String, Value>, required: &[&str], out: &mut Findings) {
    for field in required {
        if !is_present(root, field) {
            out.error(Finding::structural(
                "required.missing",
                *field,
                format!("Required field '{field}' is missing"),
                missing_suggestion(field),
            ));
        }
    }
}

/// (b) Field shapes and enum membership
pub(crate) fn check_shapes(root: &Map<String, Value>, out: &mut Findings) {
    check_id(root, out);
    check_title(root, out);
    check_mode(root, out);
    check_scope_shape(root, out);
    check_string_list(root, "invariants", true, out);
    check_acceptance_shape(root, out);
    check_contracts_shape(root, out);
    check_non_functional_shape(root, out);
    check_observability_shape(root, out);
    check_string_list(root, "rollback", false, out);
    check_waiver_ids(root, out);
}

/// Validate `risk_tier` and return the tier once it is usable
pub(crate) fn check_risk_tier(root: &Map<String, Value>, out: &mut Findings) -> Option<RiskTier> {
    let value = root.get("risk_tier").filter(|v| !v.is_null())?;

    match value.as_i64() {
        Some(level) => match RiskTier::from_level(level) {
            Some(tier) => Some(tier),
            None => {
                out.error(
                    Finding::structural(
                        "risk_tier.out_of_range",
                        "risk_tier",
                        format!("risk_tier must be 1, 2 or 3, got {level}"),
                        format!(
                            "Use risk_tier: {} (nearest valid tier)",
                            RiskTier::clamp_level(level).level()
                        ),
                    )
                    .with_observed(value.clone()),
                );
                None
            }
        },
        None => {
            out.error(
                Finding::structural(
                    "risk_tier.type",
                    "risk_tier",
                    format!("risk_tier must be an integer 1, 2 or 3, got {value}"),
                    "Use risk_tier: 1, 2 or 3 as a plain integer",
                )
                .with_observed(value.clone()),
            );
            None
        }
    }
}

fn check_id(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("id").filter(|v| !v.is_null()) else {
        return;
    };
    match value.as_str() {
        Some(id) if is_valid_spec_id(id) => {}
        _ => out.error(
            Finding::structural(
                "id.format",
                "id",
                format!("id {value} does not match {SPEC_ID_FORMAT}"),
                format!("Use an id in {SPEC_ID_FORMAT} format"),
            )
            .with_observed(value.clone()),
        ),
    }
}

fn check_title(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("title").filter(|v| !v.is_null()) else {
        return;
    };
    match value.as_str().map(str::trim) {
        Some("") | None => out.error(Finding::structural(
            "title.empty",
            "title",
            "title must be a non-empty string",
            "Add a short descriptive title",
        )),
        Some(title) if title.chars().count() < MIN_TITLE_LEN => out.warn(Finding::structural(
            "title.short",
            "title",
            format!("title '{title}' is shorter than {MIN_TITLE_LEN} characters"),
            "Describe the change in a few more words",
        )),
        Some(_) => {}
    }
}

fn check_mode(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("mode").filter(|v| !v.is_null()) else {
        return;
    };
    if value.as_str().and_then(SpecMode::parse).is_none() {
        out.error(
            Finding::structural(
                "mode.invalid",
                "mode",
                format!("mode {value} is not a known mode"),
                format!("Use one of: {}", mode_names()),
            )
            .with_observed(value.clone()),
        );
    }
}

fn check_scope_shape(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("scope").filter(|v| !v.is_null()) else {
        return;
    };
    let Some(scope) = value.as_object() else {
        out.error(Finding::structural(
            "scope.type",
            "scope",
            "scope must be a mapping with 'in' and optional 'out' lists",
            "Write scope as { in: [...], out: [...] }",
        ));
        return;
    };

    if !is_present(scope, "in") {
        out.error(Finding::structural(
            "required.missing",
            "scope.in",
            "scope.in is required",
            "List the paths this change may touch under scope.in",
        ));
    } else {
        check_nested_string_list(scope, "scope", "in", true, out);
    }
    check_nested_string_list(scope, "scope", "out", false, out);
}

fn check_string_list(
    root: &Map<String, Value>,
    field: &str,
    non_empty: bool,
    out: &mut Findings,
) {
    let Some(value) = root.get(field).filter(|v| !v.is_null()) else {
        return;
    };
    string_list_findings(value, field, non_empty, out);
}

fn check_nested_string_list(
    parent: &Map<String, Value>,
    parent_path: &str,
    field: &str,
    non_empty: bool,
    out: &mut Findings,
) {
    let Some(value) = parent.get(field).filter(|v| !v.is_null()) else {
        return;
    };
    string_list_findings(value, &format!("{parent_path}.{field}"), non_empty, out);
}

fn string_list_findings(value: &Value, path: &str, non_empty: bool, out: &mut Findings) {
    let Some(items) = value.as_array() else {
        out.error(Finding::structural(
            "field.not_a_list",
            path,
            format!("{path} must be a list"),
            format!("Write {path} as a list of strings"),
        ));
        return;
    };

    if non_empty && items.is_empty() {
        out.error(Finding::structural(
            "field.empty",
            path,
            format!("{path} must not be empty"),
            format!("Add at least one entry to {path}"),
        ));
    }

    for (i, item) in items.iter().enumerate() {
        if !item.as_str().is_some_and(|s| !s.trim().is_empty()) {
            out.error(Finding::structural(
                "field.not_a_string",
                format!("{path}[{i}]"),
                format!("{path}[{i}] must be a non-empty string"),
                format!("Replace {path}[{i}] with a plain string"),
            ));
        }
    }
}

fn check_acceptance_shape(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("acceptance").filter(|v| !v.is_null()) else {
        return;
    };
    let Some(items) = value.as_array() else {
        out.error(Finding::structural(
            "field.not_a_list",
            "acceptance",
            "acceptance must be a list of criteria",
            "Write acceptance as a list of { id, given, when, then }",
        ));
        return;
    };
    if items.is_empty() {
        out.error(Finding::structural(
            "field.empty",
            "acceptance",
            "acceptance must not be empty",
            "Add at least one acceptance criterion with id, given, when and then",
        ));
    }

    for (i, item) in items.iter().enumerate() {
        let base = format!("acceptance[{i}]");
        let Some(entry) = item.as_object() else {
            out.error(Finding::structural(
                "acceptance.type",
                &base,
                format!("{base} must be a mapping"),
                "Write each criterion as { id, given, when, then }",
            ));
            continue;
        };
        for key in ["id", "given", "when", "then"] {
            let ok = entry
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !ok {
                out.error(Finding::structural(
                    "acceptance.incomplete",
                    format!("{base}.{key}"),
                    format!("{base} is missing '{key}'"),
                    format!("Add a non-empty '{key}' to {base}"),
                ));
            }
        }
    }
}

fn check_contracts_shape(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("contracts").filter(|v| !v.is_null()) else {
        return;
    };
    let Some(items) = value.as_array() else {
        out.error(Finding::structural(
            "field.not_a_list",
            "contracts",
            "contracts must be a list",
            "Write contracts as a list of { type, path }",
        ));
        return;
    };

    for (i, item) in items.iter().enumerate() {
        let base = format!("contracts[{i}]");
        let Some(entry) = item.as_object() else {
            out.error(Finding::structural(
                "contracts.entry_type",
                &base,
                format!("{base} must be a mapping"),
                "Write each contract as { type, path }",
            ));
            continue;
        };

        match entry.get("type") {
            Some(t) if t.as_str().and_then(ContractType::parse).is_some() => {}
            other => out.error(
                Finding::structural(
                    "contracts.type_invalid",
                    format!("{base}.type"),
                    format!("{base}.type must be one of: {}", contract_type_names()),
                    format!("Use one of: {}", contract_type_names()),
                )
                .with_observed(other.cloned().unwrap_or(Value::Null)),
            ),
        }

        let has_path = entry
            .get("path")
            .and_then(Value::as_str)
            .is_some_and(|p| !p.trim().is_empty());
        if !has_path {
            out.error(Finding::structural(
                "contracts.path_missing",
                format!("{base}.path"),
                format!("{base} is missing 'path'"),
                "Point path at the contract file, e.g. docs/api/openapi.yaml",
            ));
        }
    }
}

fn check_non_functional_shape(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("non_functional").filter(|v| !v.is_null()) else {
        return;
    };
    let Some(nf) = value.as_object() else {
        out.error(Finding::structural(
            "non_functional.type",
            "non_functional",
            "non_functional must be a mapping of requirement lists",
            "Write non_functional as { a11y: [...], perf: [...], security: [...] }",
        ));
        return;
    };
    for (key, item) in nf {
        if item.is_null() {
            continue;
        }
        string_list_findings(item, &format!("non_functional.{key}"), false, out);
    }
}

fn check_observability_shape(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("observability").filter(|v| !v.is_null()) else {
        return;
    };
    let Some(obs) = value.as_object() else {
        out.error(Finding::structural(
            "observability.type",
            "observability",
            "observability must be a mapping of logs, metrics and traces",
            "Write observability as { logs: [...], metrics: [...], traces: [...] }",
        ));
        return;
    };
    for key in ["logs", "metrics", "traces"] {
        if let Some(item) = obs.get(key).filter(|v| !v.is_null()) {
            string_list_findings(item, &format!("observability.{key}"), false, out);
        }
    }
}

fn check_waiver_ids(root: &Map<String, Value>, out: &mut Findings) {
    let Some(value) = root.get("waiver_ids").filter(|v| !v.is_null()) else {
        return;
    };
    let Some(items) = value.as_array() else {
        string_list_findings(value, "waiver_ids", false, out);
        return;
    };
    for (i, item) in items.iter().enumerate() {
        if !item.as_str().is_some_and(is_valid_waiver_id) {
            out.error(
                Finding::structural(
                    "waiver_ids.format",
                    format!("waiver_ids[{i}]"),
                    format!("waiver_ids[{i}] is not a waiver id of the form WV-NNNN"),
                    "Reference waivers by id, e.g. WV-0001",
                )
                .with_observed(item.clone()),
            );
        }
    }
}

/// (c) Cross-field rules
pub(crate) fn check_cross_field(
    root: &Map<String, Value>,
    glob_chars: &[char],
    out: &mut Findings,
) {
    check_unique_acceptance_ids(root, out);
    check_scope_out_literal(root, glob_chars, out);
}

fn check_unique_acceptance_ids(root: &Map<String, Value>, out: &mut Findings) {
    let Some(items) = root.get("acceptance").and_then(Value::as_array) else {
        return;
    };
    let ids: Vec<Option<&str>> = items
        .iter()
        .map(|item| item.get("id").and_then(Value::as_str))
        .collect();
    let existing: Vec<&str> = ids.iter().flatten().copied().collect();

    let mut seen = HashSet::new();
    for (i, id) in ids.iter().enumerate() {
        let Some(id) = id else { continue };
        if !seen.insert(*id) {
            out.error(
                Finding::structural(
                    "acceptance.duplicate_id",
                    format!("acceptance[{i}].id"),
                    format!("acceptance id '{id}' is used more than once"),
                    "Give every acceptance criterion a unique id",
                )
                .with_observed(json!({ "id": id, "existing": existing })),
            );
        }
    }
}

fn check_scope_out_literal(root: &Map<String, Value>, glob_chars: &[char], out: &mut Findings) {
    let Some(items) = root
        .get("scope")
        .and_then(|s| s.get("out"))
        .and_then(Value::as_array)
    else {
        return;
    };

    for (i, item) in items.iter().enumerate() {
        let Some(path) = item.as_str() else { continue };
        if path.contains(glob_chars) {
            out.error(
                Finding::structural(
                    "scope.out.glob",
                    format!("scope.out[{i}]"),
                    format!("scope.out entry '{path}' contains glob wildcards"),
                    "List literal paths in scope.out; wildcards there silently exclude more than intended",
                )
                .with_observed(item.clone()),
            );
        }
    }
}

fn non_empty_list(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

fn non_functional_list<'a>(root: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    let nf = root.get("non_functional")?.as_object()?;
    names.iter().find_map(|name| nf.get(*name).filter(|v| !v.is_null()))
}

/// (d) Tier-specific requirements
pub(crate) fn check_tier_rules(
    root: &Map<String, Value>,
    tier: RiskTier,
    policy: &Policy,
    out: &mut Findings,
) {
    if tier == RiskTier::Critical {
        let obs_present = root
            .get("observability")
            .and_then(Value::as_object)
            .is_some_and(|obs| {
                ["logs", "metrics", "traces"]
                    .iter()
                    .any(|key| non_empty_list(obs.get(*key)))
            });
        if !obs_present {
            out.error(Finding::business_rule(
                "tier1.observability_missing",
                "observability",
                "Tier 1 specs require an observability plan (logs, metrics or traces)",
                "Add observability with the logs, metrics and traces that show this change working",
            ));
        }

        if !non_empty_list(root.get("rollback")) {
            out.error(Finding::business_rule(
                "tier1.rollback_missing",
                "rollback",
                "Tier 1 specs require a rollback plan",
                "Add rollback listing the steps that revert this change safely",
            ));
        }

        if !non_empty_list(non_functional_list(root, &["security"])) {
            out.error(Finding::business_rule(
                "tier1.security_missing",
                "non_functional.security",
                "Tier 1 specs require non_functional.security requirements",
                "List the security requirements under non_functional.security",
            ));
        }
    }

    let contracts_required = policy
        .tier(tier)
        .is_some_and(|settings| settings.requires_contracts());
    if contracts_required && !non_empty_list(root.get("contracts")) {
        out.error(Finding::business_rule(
            "contracts.required",
            "contracts",
            format!("Policy requires contracts for {tier} work"),
            format!(
                "Add contracts with at least one {{ type, path }} entry ({})",
                contract_type_names()
            ),
        ));
    }
}

/// Advisory warnings that never fail validation
pub(crate) fn check_advisories(
    root: &Map<String, Value>,
    tier: Option<RiskTier>,
    out: &mut Findings,
) {
    if let Some(items) = root
        .get("scope")
        .and_then(|s| s.get("in"))
        .and_then(Value::as_array)
    {
        for (i, item) in items.iter().enumerate() {
            let Some(path) = item.as_str() else { continue };
            if path.starts_with('/') || path.chars().nth(1) == Some(':') {
                out.warn(
                    Finding::new(
                        FindingKind::Structural,
                        "scope.in.absolute",
                        format!("scope.in[{i}]"),
                        format!("scope.in entry '{path}' is an absolute path"),
                        "Use paths relative to the project root",
                    )
                    .with_observed(item.clone()),
                );
            }
        }
    }

    let Some(tier) = tier else { return };
    let nf_present = root.get("non_functional").is_some_and(Value::is_object);

    if !nf_present && tier != RiskTier::Critical {
        out.warn(Finding::business_rule(
            "non_functional.missing",
            "non_functional",
            format!("{tier} specs should state non-functional requirements"),
            "Add non_functional with a11y, perf and security lists",
        ));
        return;
    }

    if tier != RiskTier::Low && !non_empty_list(non_functional_list(root, &["perf", "performance"]))
    {
        out.warn(Finding::business_rule(
            "non_functional.perf_missing",
            "non_functional.perf",
            format!("{tier} specs should state performance requirements"),
            "List performance budgets under non_functional.perf",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn codes(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn test_risk_tier_variants() {
        let mut out = Findings::default();
        assert_eq!(
            check_risk_tier(&obj(json!({ "risk_tier": 2 })), &mut out),
            Some(RiskTier::Standard)
        );
        assert!(check_risk_tier(&obj(json!({ "risk_tier": 0 })), &mut out).is_none());
        assert!(check_risk_tier(&obj(json!({ "risk_tier": "high" })), &mut out).is_none());
        assert!(check_risk_tier(&obj(json!({})), &mut out).is_none());
        assert_eq!(
            codes(&out.errors),
            vec!["risk_tier.out_of_range", "risk_tier.type"]
        );
    }

    #[test]
    fn test_duplicate_acceptance_ids_report_later_entry() {
        let root = obj(json!({
            "acceptance": [
                { "id": "A1", "given": "g", "when": "w", "then": "t" },
                { "id": "A2", "given": "g", "when": "w", "then": "t" },
                { "id": "A1", "given": "g", "when": "w", "then": "t" }
            ]
        }));
        let mut out = Findings::default();
        check_cross_field(&root, &['*'], &mut out);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].field, "acceptance[2].id");
    }

    #[test]
    fn test_scope_out_glob() {
        let root = obj(json!({
            "scope": { "in": ["src/"], "out": ["vendor/", "src/**/legacy", "a?b"] }
        }));
        let mut out = Findings::default();
        check_cross_field(&root, &['*', '?'], &mut out);
        let fields: Vec<_> = out.errors.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["scope.out[1]", "scope.out[2]"]);
    }

    #[test]
    fn test_tier_three_skips_contracts_under_default_policy() {
        let mut out = Findings::default();
        check_tier_rules(&obj(json!({})), RiskTier::Low, &Policy::default_policy(), &mut out);
        assert!(out.errors.is_empty());

        check_tier_rules(
            &obj(json!({})),
            RiskTier::Standard,
            &Policy::default_policy(),
            &mut out,
        );
        assert_eq!(codes(&out.errors), vec!["contracts.required"]);
    }

    #[test]
    fn test_empty_observability_lists_do_not_count() {
        let root = obj(json!({
            "observability": { "logs": [], "metrics": [] },
            "rollback": ["revert flag"],
            "non_functional": { "security": ["authz"] },
            "contracts": [{ "type": "openapi", "path": "api.yaml" }]
        }));
        let mut out = Findings::default();
        check_tier_rules(&root, RiskTier::Critical, &Policy::default_policy(), &mut out);
        assert_eq!(codes(&out.errors), vec!["tier1.observability_missing"]);
    }

    #[test]
    fn test_advisories() {
        let root = obj(json!({
            "scope": { "in": ["/etc/app", "src/"] },
            "non_functional": { "security": ["authz"] }
        }));
        let mut out = Findings::default();
        check_advisories(&root, Some(RiskTier::Standard), &mut out);
        assert_eq!(
            codes(&out.warnings),
            vec!["scope.in.absolute", "non_functional.perf_missing"]
        );
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_missing_non_functional_single_warning() {
        let mut out = Findings::default();
        check_advisories(&obj(json!({})), Some(RiskTier::Standard), &mut out);
        assert_eq!(codes(&out.warnings), vec!["non_functional.missing"]);
    }
}
