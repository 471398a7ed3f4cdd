//! Working specifications
//!
//! A WorkingSpec identifies a unit of work before it begins. It is authored
//! by a scaffolding tool or a human, is read-only to the governance core,
//! and is re-validated on every gate check.
//!
//! The typed form here is only built from documents that already passed
//! structural validation; raw documents are validated as value trees.

use crate::tier::RiskTier;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Specification for a unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingSpec {
    /// Identifier, `TYPE-NNNN`
    pub id: String,

    /// Short human-readable title
    pub title: String,

    /// Risk classification
    pub risk_tier: RiskTier,

    /// Kind of change
    pub mode: SpecMode,

    /// Paths the work may and may not touch
    pub scope: Scope,

    /// Statements that must hold before and after the change
    pub invariants: Vec<String>,

    /// Given/When/Then acceptance criteria
    pub acceptance: Vec<AcceptanceCriterion>,

    /// API descriptions the change is bound to
    #[serde(default)]
    pub contracts: Vec<Contract>,

    /// Accessibility, performance and security requirements
    #[serde(default)]
    pub non_functional: NonFunctional,

    /// Required for tier 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<Observability>,

    /// Rollback procedure, required for tier 1
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rollback: Vec<String>,

    /// Waivers this unit of work relies on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waiver_ids: Vec<String>,
}

impl WorkingSpec {
    /// Build the typed spec from a validated document tree.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Kind of change a spec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecMode {
    Feature,
    Refactor,
    Fix,
    Doc,
    Chore,
}

impl SpecMode {
    pub const ALL: [SpecMode; 5] = [
        SpecMode::Feature,
        SpecMode::Refactor,
        SpecMode::Fix,
        SpecMode::Doc,
        SpecMode::Chore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SpecMode::Feature => "feature",
            SpecMode::Refactor => "refactor",
            SpecMode::Fix => "fix",
            SpecMode::Doc => "doc",
            SpecMode::Chore => "chore",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == raw)
    }
}

impl fmt::Display for SpecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path scope of a unit of work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// Globs the work may touch
    #[serde(rename = "in")]
    pub include: Vec<String>,

    /// Literal paths the work must not touch
    #[serde(rename = "out", default)]
    pub exclude: Vec<String>,
}

/// A Given/When/Then acceptance criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    /// Stable identifier, unique within the spec
    pub id: String,
    pub given: String,
    pub when: String,
    pub then: String,
}

/// API description formats a contract may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Openapi,
    Graphql,
    Proto,
    Pact,
}

impl ContractType {
    pub const ALL: [ContractType; 4] = [
        ContractType::Openapi,
        ContractType::Graphql,
        ContractType::Proto,
        ContractType::Pact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractType::Openapi => "openapi",
            ContractType::Graphql => "graphql",
            ContractType::Proto => "proto",
            ContractType::Pact => "pact",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

/// Contract binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "type")]
    pub contract_type: ContractType,
    pub path: String,
}

/// Non-functional requirement lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFunctional {
    #[serde(default, alias = "accessibility")]
    pub a11y: Vec<String>,
    #[serde(default, alias = "performance")]
    pub perf: Vec<String>,
    #[serde(default)]
    pub security: Vec<String>,
}

/// Observability plan, required for tier 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observability {
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub traces: Vec<String>,
}

impl Observability {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.metrics.is_empty() && self.traces.is_empty()
    }
}
