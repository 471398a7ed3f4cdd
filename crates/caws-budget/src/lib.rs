//! # CAWS Budget Engine
//!
//! Derives the change budget for a unit of work: the policy tier baseline,
//! raised by every effective `budget_limit` waiver, and reports how much of
//! it a change uses.
//!
//! ## Key Components
//!
//! - [`BudgetEngine`]: budget derivation and usage findings
//! - [`calculate_budget_utilization`]: percent of budget used, unclamped
//! - [`is_approaching_limit`]: tiered notice from a utilization
//!
//! Derivation is deterministic for a given `now`: the same tier, policy and
//! waiver set always produce the same [`caws_types::BudgetResult`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod engine;
pub mod utilization;

pub use engine::{BudgetEngine, UsageFindings};
pub use utilization::{calculate_budget_utilization, is_approaching_limit, ChangeStats};
