//! Governance tool registry
//!
//! Each capability the CLI and agent layers can invoke is a named,
//! statically known [`GovernanceTool`]. Callers pick one by id from a
//! [`ToolRegistry`]; an unknown id is an error value.

use crate::engine::{GateEngine, GateRequest};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use caws_types::{AutoFix, BudgetResult, ValidationResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// What a tool produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Validation(ValidationResult),
    Budget(BudgetResult),
    Fixes(Vec<AutoFix>),
}

impl ToolOutput {
    pub fn as_validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Validation(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_budget(&self) -> Option<&BudgetResult> {
        match self {
            Self::Budget(budget) => Some(budget),
            _ => None,
        }
    }

    pub fn as_fixes(&self) -> Option<&[AutoFix]> {
        match self {
            Self::Fixes(fixes) => Some(fixes),
            _ => None,
        }
    }
}

/// A governance capability invocable by id
#[async_trait]
pub trait GovernanceTool: Send + Sync + std::fmt::Debug {
    /// Registry key
    fn id(&self) -> &str;

    fn description(&self) -> &str {
        "Governance tool"
    }

    async fn run(&self, engine: &GateEngine, request: &GateRequest) -> Result<ToolOutput>;
}

/// Spec validation without budget
#[derive(Debug, Default)]
pub struct ValidateTool;

#[async_trait]
impl GovernanceTool for ValidateTool {
    fn id(&self) -> &str {
        "validate"
    }

    fn description(&self) -> &str {
        "Validate a working spec against the project policy"
    }

    async fn run(&self, engine: &GateEngine, request: &GateRequest) -> Result<ToolOutput> {
        Ok(ToolOutput::Validation(engine.validate(request).await))
    }
}

/// Effective budget for the spec's tier and waivers
#[derive(Debug, Default)]
pub struct DeriveBudgetTool;

#[async_trait]
impl GovernanceTool for DeriveBudgetTool {
    fn id(&self) -> &str {
        "derive_budget"
    }

    fn description(&self) -> &str {
        "Derive the change budget from policy and waivers"
    }

    async fn run(&self, engine: &GateEngine, request: &GateRequest) -> Result<ToolOutput> {
        Ok(ToolOutput::Budget(engine.derive_budget(request).await?))
    }
}

/// Auto-fix suggestions, nothing applied
#[derive(Debug, Default)]
pub struct SuggestFixesTool;

#[async_trait]
impl GovernanceTool for SuggestFixesTool {
    fn id(&self) -> &str {
        "suggest_fixes"
    }

    fn description(&self) -> &str {
        "Suggest fixes for spec validation findings"
    }

    async fn run(&self, engine: &GateEngine, request: &GateRequest) -> Result<ToolOutput> {
        let result = engine.validate(request).await;
        Ok(ToolOutput::Fixes(engine.advisor().suggest_fixes(&result)))
    }
}

/// Full gate: validation, waivers and budget merged
#[derive(Debug, Default)]
pub struct GateCheckTool;

#[async_trait]
impl GovernanceTool for GateCheckTool {
    fn id(&self) -> &str {
        "gate_check"
    }

    fn description(&self) -> &str {
        "Run the full quality gate and return one verdict"
    }

    async fn run(&self, engine: &GateEngine, request: &GateRequest) -> Result<ToolOutput> {
        Ok(ToolOutput::Validation(engine.check(request).await))
    }
}

/// Lookup table of governance tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn GovernanceTool>>,
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `validate`, `derive_budget`, `suggest_fixes` and
    /// `gate_check`
    pub fn with_builtin_tools() -> Self {
        Self::new()
            .register(Arc::new(ValidateTool))
            .register(Arc::new(DeriveBudgetTool))
            .register(Arc::new(SuggestFixesTool))
            .register(Arc::new(GateCheckTool))
    }

    /// Add a tool. A tool with the same id is replaced.
    pub fn register(mut self, tool: Arc<dyn GovernanceTool>) -> Self {
        self.tools.insert(tool.id().to_string(), tool);
        self
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn GovernanceTool>> {
        self.tools
            .get(id)
            .cloned()
            .ok_or_else(|| GateError::UnknownTool {
                id: id.to_string(),
                available: self.ids(),
            })
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up `id` and run it
    pub async fn run(
        &self,
        id: &str,
        engine: &GateEngine,
        request: &GateRequest,
    ) -> Result<ToolOutput> {
        let tool = self.get(id)?;
        debug!(tool = id, "Running governance tool");
        tool.run(engine, request).await
    }
}
