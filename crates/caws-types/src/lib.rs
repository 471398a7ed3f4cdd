//! CAWS Types - Core data model for the governance engine
//!
//! The governance core decides whether a proposed unit of work (a *working
//! spec*) may proceed, under which budget, and with which exceptions.
//! This crate holds the documents it reasons about and the verdict it
//! returns; it performs no I/O.
//!
//! ## Key Concepts
//!
//! - **WorkingSpec**: the unit of work, classified by a [`RiskTier`]
//! - **Policy**: per-tier budgets and quality thresholds for a project
//! - **Waiver**: a time-boxed, approved exception for one or more gates
//! - **Budget**: the files / lines-of-change ceiling for a unit of work
//! - **ValidationResult**: the flat, machine-readable verdict consumed by
//!   the CLI and agent tooling
//!
//! ## Architectural Boundaries
//!
//! - **caws-types** owns: document shapes, parsing, identifiers, scoring
//! - **caws-policy** / **caws-waiver** own: loading documents from disk
//! - **caws-validator** / **caws-budget** own: deriving verdicts

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod budget;
pub mod document;
pub mod error;
pub mod ids;
pub mod policy;
pub mod result;
pub mod score;
pub mod spec;
pub mod tier;
pub mod waiver;

pub use budget::{AppliedWaiver, Budget, BudgetResult, LimitNotice, Utilization};
pub use document::{parse_document, parse_timestamp, DocumentFormat};
pub use error::{DocumentError, Result};
pub use ids::{is_valid_spec_id, is_valid_waiver_id};
pub use policy::{Policy, TierPolicy, WaiverApproval, DEFAULT_REQUIRED_APPROVERS};
pub use result::{AutoFix, Finding, FindingKind, ValidationResult};
pub use score::{compliance_score, ComplianceGrade};
pub use spec::{
    AcceptanceCriterion, Contract, ContractType, NonFunctional, Observability, Scope, SpecMode,
    WorkingSpec,
};
pub use tier::RiskTier;
pub use waiver::{
    BudgetDelta, Waiver, WaiverEligibility, WaiverReason, WaiverStatus, BUDGET_LIMIT_GATE,
};
