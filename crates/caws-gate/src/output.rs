//! Rendering verdicts for humans and machines

use crate::error::{GateError, Result};
use caws_types::{BudgetResult, Finding, LimitNotice, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

/// Output mode requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Flat `ValidationResult` JSON object
    Json,
}

impl FromStr for OutputFormat {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "human" => Ok(Self::Text),
            "json" | "structured" => Ok(Self::Json),
            other => Err(GateError::InvalidInput(format!(
                "unknown output format '{other}', expected text or json"
            ))),
        }
    }
}

/// Render a verdict in the requested format
pub fn render(result: &ValidationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &ValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.passed { "PASSED" } else { "FAILED" };
    let _ = writeln!(
        out,
        "{verdict}  compliance {:.1} (grade {})",
        result.compliance_score,
        result.grade()
    );

    write_findings(&mut out, "Errors", &result.errors);
    write_findings(&mut out, "Warnings", &result.warnings);

    if let Some(budget) = &result.budget {
        write_budget(&mut out, budget);
    }

    if !result.auto_fixes.is_empty() {
        let _ = writeln!(out, "\nSuggested fixes ({}):", result.auto_fixes.len());
        for fix in &result.auto_fixes {
            let _ = writeln!(
                out,
                "  - {}: {} -> {}",
                fix.field, fix.description, fix.proposed_value
            );
        }
    }

    out
}

fn write_findings(out: &mut String, heading: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading} ({}):", findings.len());
    for finding in findings {
        let _ = writeln!(out, "  - {}: {}", finding.field, finding.message);
        let _ = writeln!(out, "    fix: {}", finding.suggestion);
    }
}

fn write_budget(out: &mut String, budget: &BudgetResult) {
    let _ = writeln!(
        out,
        "\nBudget ({}): {} (baseline {})",
        budget.tier, budget.effective, budget.baseline
    );
    let applied = budget.applied_waiver_ids();
    if !applied.is_empty() {
        let _ = writeln!(out, "  waivers applied: {}", applied.join(", "));
    }
    if let Some(u) = &budget.utilization {
        let _ = write!(
            out,
            "  used: files {:.0}%, loc {:.0}%",
            u.files_pct, u.loc_pct
        );
        if budget.limit_notice != LimitNotice::None {
            let _ = write!(out, " [{}]", budget.limit_notice.as_str());
        }
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caws_types::{AppliedWaiver, Budget, BudgetDelta, RiskTier, Utilization};

    fn sample() -> ValidationResult {
        let mut result = ValidationResult::from_findings(
            vec![Finding::structural(
                "mode.invalid",
                "mode",
                "mode \"rewrite\" is not a known mode",
                "Use one of: feature, refactor, fix, doc, chore",
            )],
            Vec::new(),
        );
        result.budget = Some(BudgetResult {
            tier: RiskTier::Standard,
            baseline: Budget::new(50, 2000),
            effective: Budget::new(60, 2000),
            applied_waivers: vec![AppliedWaiver {
                id: "WV-0001".into(),
                delta: BudgetDelta {
                    max_files: 10,
                    max_loc: 0,
                },
            }],
            warnings: Vec::new(),
            utilization: Some(Utilization {
                files_pct: 90.0,
                loc_pct: 10.0,
                overall_pct: 90.0,
            }),
            limit_notice: LimitNotice::Warning,
        });
        result
    }

    #[test]
    fn test_json_is_flat_and_camel_case() {
        let json: serde_json::Value =
            serde_json::from_str(&render(&sample(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["complianceScore"], 0.8);
        assert_eq!(json["errors"][0]["field"], "mode");
        assert!(json["errors"][0]["suggestion"].is_string());
        assert_eq!(json["budget"]["effective"]["max_files"], 60);
        assert_eq!(json["budget"]["appliedWaivers"][0]["id"], "WV-0001");
        assert!(json["autoFixes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_text_summary() {
        let text = render(&sample(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("FAILED  compliance 0.8 (grade B)"));
        assert!(text.contains("fix: Use one of"));
        assert!(text
            .contains("Budget (tier 2): 60 files / 2000 LOC (baseline 50 files / 2000 LOC)"));
        assert!(text.contains("waivers applied: WV-0001"));
        assert!(text.contains("[warning]"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
