//! Gate engine
//!
//! Wires the policy store, waiver store, validator and budget engine into
//! one gate check that returns a single merged verdict.

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::output::{render, OutputFormat};
use caws_budget::{BudgetEngine, ChangeStats, UsageFindings};
use caws_policy::{
    CacheStatus, FilePolicyStore, PolicyCache, PolicyError, PolicyResolution, PolicyStore,
    TtlPolicyCache,
};
use caws_types::{
    is_valid_waiver_id, parse_document, BudgetResult, DocumentFormat, Finding, FindingKind,
    Policy, RiskTier, ValidationResult, DEFAULT_REQUIRED_APPROVERS,
};
use caws_validator::{AutoFixAdvisor, SpecValidator};
use caws_waiver::{FileWaiverStore, WaiverLoadError, WaiverStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Flags the CLI and agent layers pass through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOptions {
    /// Validate the spec only; skip budget derivation
    pub validate_only: bool,

    /// Embed auto-fix suggestions (dry run, nothing is applied)
    pub auto_fix_preview: bool,

    /// How the caller wants the verdict rendered
    pub output: OutputFormat,

    /// Actual size of the change, when known
    pub change_stats: Option<ChangeStats>,
}

/// One gate check
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub project_root: PathBuf,
    pub spec: Value,
    pub options: GateOptions,
    /// Evaluation time for waiver expiry, now when unset
    pub at: Option<DateTime<Utc>>,
}

impl GateRequest {
    pub fn new(project_root: impl Into<PathBuf>, spec: Value) -> Self {
        Self {
            project_root: project_root.into(),
            spec,
            options: GateOptions::default(),
            at: None,
        }
    }

    pub fn with_options(mut self, options: GateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate_only(mut self) -> Self {
        self.options.validate_only = true;
        self
    }

    pub fn with_auto_fix_preview(mut self) -> Self {
        self.options.auto_fix_preview = true;
        self
    }

    pub fn with_output(mut self, format: OutputFormat) -> Self {
        self.options.output = format;
        self
    }

    pub fn with_change_stats(mut self, files: u64, loc: u64) -> Self {
        self.options.change_stats = Some(ChangeStats::new(files, loc));
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.at = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }

    fn spec_id(&self) -> &str {
        self.spec
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<none>")
    }

    fn tier(&self) -> Option<RiskTier> {
        self.spec
            .get("risk_tier")
            .and_then(Value::as_i64)
            .and_then(RiskTier::from_level)
    }

    /// Well-formed waiver ids referenced by the spec, first occurrence only
    fn waiver_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let listed = self
            .spec
            .get("waiver_ids")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter(|id| is_valid_waiver_id(id));
        for id in listed {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// Governance gate over a project
#[derive(Debug, Clone)]
pub struct GateEngine {
    config: GateConfig,
    cache: Arc<dyn PolicyCache>,
    policy_store: Arc<dyn PolicyStore>,
    waiver_store: Option<Arc<dyn WaiverStore>>,
    advisor: AutoFixAdvisor,
    budget: BudgetEngine,
}

impl GateEngine {
    /// Engine with file-backed stores and a fresh policy cache
    pub fn new(config: GateConfig) -> Self {
        let cache: Arc<dyn PolicyCache> =
            Arc::new(TtlPolicyCache::with_ttl_secs(config.cache_ttl_secs()));
        let policy_store = Arc::new(FilePolicyStore::new(Arc::clone(&cache)));
        Self {
            config,
            cache,
            policy_store,
            waiver_store: None,
            advisor: AutoFixAdvisor::new(),
            budget: BudgetEngine::new(),
        }
    }

    /// Load `<project_root>/.caws/gate.toml` and build an engine from it
    pub fn for_project(project_root: &Path) -> Result<Self> {
        Ok(Self::new(GateConfig::load(project_root)?))
    }

    /// Share a policy cache, e.g. one owned by a long-running host
    pub fn with_policy_cache(mut self, cache: Arc<dyn PolicyCache>) -> Self {
        self.policy_store = Arc::new(FilePolicyStore::new(Arc::clone(&cache)));
        self.cache = cache;
        self
    }

    /// Replace the policy store; `cache` is what status and invalidation act on
    pub fn with_policy_store(
        mut self,
        store: Arc<dyn PolicyStore>,
        cache: Arc<dyn PolicyCache>,
    ) -> Self {
        self.policy_store = store;
        self.cache = cache;
        self
    }

    /// Use this waiver store instead of `<project>/<waivers_dir>`
    pub fn with_waiver_store(mut self, store: Arc<dyn WaiverStore>) -> Self {
        self.waiver_store = Some(store);
        self
    }

    pub fn with_advisor(mut self, advisor: AutoFixAdvisor) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn advisor(&self) -> &AutoFixAdvisor {
        &self.advisor
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Drop the cached policy for a project. Returns whether one was cached.
    pub fn invalidate_policy(&self, project_root: &Path) -> bool {
        self.cache.invalidate(&self.config.policy_path_in(project_root))
    }

    /// Read and parse a spec file
    pub async fn load_spec(path: &Path) -> Result<Value> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GateError::SpecUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(parse_document(&text, DocumentFormat::from_path(path))?)
    }

    /// Resolve the project policy, applying the configured approver default
    pub async fn resolve_policy(
        &self,
        project_root: &Path,
    ) -> std::result::Result<PolicyResolution, PolicyError> {
        let path = self.config.policy_path_in(project_root);
        let mut resolution = self.policy_store.resolve(&path).await?;
        let is_builtin = resolution.is_default();
        resolution.policy = self.with_default_approvers(resolution.policy, is_builtin);
        Ok(resolution)
    }

    fn with_default_approvers(&self, policy: Arc<Policy>, is_builtin: bool) -> Arc<Policy> {
        let approvers = self.config.default_required_approvers;
        let declared = policy
            .waiver_approval
            .as_ref()
            .and_then(|w| w.required_approvers);
        if approvers == DEFAULT_REQUIRED_APPROVERS || (declared.is_some() && !is_builtin) {
            return policy;
        }

        let mut adjusted = (*policy).clone();
        adjusted
            .waiver_approval
            .get_or_insert_with(Default::default)
            .required_approvers = Some(approvers);
        Arc::new(adjusted)
    }

    /// Validate the spec against the project policy, no budget
    pub async fn validate(&self, request: &GateRequest) -> ValidationResult {
        let request = request.clone().validate_only();
        self.check(&request).await
    }

    /// Derive the budget for the spec's tier and waivers
    pub async fn derive_budget(&self, request: &GateRequest) -> Result<BudgetResult> {
        let tier = request.tier().ok_or_else(|| {
            GateError::InvalidInput(
                "spec risk_tier must be 1, 2 or 3 to derive a budget".to_string(),
            )
        })?;
        let resolution = self.resolve_policy(&request.project_root).await?;
        let (mut budget, _) = self.budget_for(request, tier, &resolution.policy).await;
        if let Some(warning) = resolution.warning {
            budget.warnings.insert(0, warning);
        }
        Ok(budget)
    }

    /// Run the full gate: policy, validation, waivers and budget, merged
    /// into one verdict. Never fails; every problem is a finding.
    pub async fn check(&self, request: &GateRequest) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let (policy, policy_usable) = match self.resolve_policy(&request.project_root).await {
            Ok(resolution) => {
                warnings.extend(resolution.warning);
                (resolution.policy, true)
            }
            Err(err) => {
                warn!(error = %err, "Policy unusable, validating against built-in tiers");
                errors.extend(policy_error_findings(&err));
                (Arc::new(Policy::default_policy()), false)
            }
        };

        let mut result = SpecValidator::new(Arc::clone(&policy)).validate(&request.spec);
        result.errors.extend(errors);
        result.warnings.extend(warnings);

        if !request.options.validate_only {
            match (policy_usable, request.tier()) {
                (true, Some(tier)) => {
                    let (budget, usage) = self.budget_for(request, tier, &policy).await;
                    result.warnings.extend(budget.warnings.iter().cloned());
                    if let Some(overrun) = usage.overrun {
                        if self.config.fail_on_budget_overrun {
                            result.errors.push(overrun);
                        } else {
                            result.warnings.push(overrun);
                        }
                    }
                    result.warnings.extend(usage.approaching);
                    result.budget = Some(budget);
                }
                (false, _) => debug!("Budget skipped: policy unusable"),
                (_, None) => debug!("Budget skipped: no valid risk_tier"),
            }
        }

        result.finalize();

        if request.options.auto_fix_preview {
            result.auto_fixes = self.advisor.suggest_fixes(&result);
        }

        if result.passed {
            info!(
                spec_id = request.spec_id(),
                score = result.compliance_score,
                warnings = result.warnings.len(),
                "Gate passed"
            );
        } else {
            warn!(
                spec_id = request.spec_id(),
                score = result.compliance_score,
                errors = result.errors.len(),
                "Gate failed"
            );
        }

        result
    }

    /// Run the gate and render the verdict in the request's output format
    pub async fn check_rendered(
        &self,
        request: &GateRequest,
    ) -> Result<(ValidationResult, String)> {
        let result = self.check(request).await;
        let rendered = render(&result, request.options.output)?;
        Ok((result, rendered))
    }

    async fn budget_for(
        &self,
        request: &GateRequest,
        tier: RiskTier,
        policy: &Policy,
    ) -> (BudgetResult, UsageFindings) {
        let ids = request.waiver_ids();

        let file_store;
        let store: &dyn WaiverStore = match &self.waiver_store {
            Some(store) => store.as_ref(),
            None => {
                file_store =
                    FileWaiverStore::new(self.config.waivers_dir_in(&request.project_root));
                &file_store
            }
        };

        let batch = store.load_many(&ids).await;
        let mut budget = self
            .budget
            .derive_budget_at(tier, policy, &batch.waivers, request.now());

        let mut warnings: Vec<Finding> = batch
            .failures
            .iter()
            .map(WaiverLoadError::to_finding)
            .collect();
        warnings.append(&mut budget.warnings);
        budget.warnings = warnings;

        let usage = match request.options.change_stats {
            Some(stats) => self.budget.check_usage(&mut budget, stats),
            None => UsageFindings::default(),
        };

        (budget, usage)
    }
}

/// Findings for a policy file that exists but cannot be used. Each
/// structural violation names the file and the field to fix.
fn policy_error_findings(err: &PolicyError) -> Vec<Finding> {
    let path = err.path().display().to_string();
    match err.violations() {
        [] => vec![Finding::new(
            FindingKind::Policy,
            err.code(),
            "policy",
            err.to_string(),
            format!("Fix {path}, or remove it to fall back to the built-in policy"),
        )],
        violations => violations
            .iter()
            .map(|v| {
                Finding::new(
                    FindingKind::Policy,
                    err.code(),
                    v.field.clone(),
                    format!("{path}: {}: {}", v.field, v.message),
                    format!("Edit {} in {path}", v.field),
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_waiver_ids_deduplicated_and_filtered() {
        let request = GateRequest::new(
            "/tmp/project",
            json!({ "waiver_ids": ["WV-0001", "bogus", "WV-0002", "WV-0001", 7] }),
        );
        assert_eq!(request.waiver_ids(), vec!["WV-0001", "WV-0002"]);
    }

    #[test]
    fn test_tier_from_spec() {
        assert_eq!(
            GateRequest::new("/p", json!({ "risk_tier": 1 })).tier(),
            Some(RiskTier::Critical)
        );
        assert!(GateRequest::new("/p", json!({ "risk_tier": 4 })).tier().is_none());
    }

    #[test]
    fn test_configured_approvers_override_builtin_policy_only() {
        let engine = GateEngine::new(GateConfig::default().with_default_required_approvers(2));

        let builtin = engine.with_default_approvers(Arc::new(Policy::default_policy()), true);
        assert_eq!(builtin.required_approvers(), 2);

        let declared = engine.with_default_approvers(Arc::new(Policy::default_policy()), false);
        assert_eq!(declared.required_approvers(), 1);

        let mut silent = Policy::default_policy();
        silent.waiver_approval = None;
        let silent = engine.with_default_approvers(Arc::new(silent), false);
        assert_eq!(silent.required_approvers(), 2);
    }

    #[test]
    fn test_policy_error_findings_name_path_and_field() {
        let err = PolicyError::Invalid {
            path: PathBuf::from("/repo/.caws/policy.yaml"),
            violations: vec![caws_policy::PolicyViolation::new(
                "risk_tiers.2.max_loc",
                "max_loc must be a positive integer",
            )],
        };
        let findings = policy_error_findings(&err);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field, "risk_tiers.2.max_loc");
        assert!(findings[0].message.contains("/repo/.caws/policy.yaml"));
        assert_eq!(findings[0].kind, FindingKind::Policy);
    }
}
