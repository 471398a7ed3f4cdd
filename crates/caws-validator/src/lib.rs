//! # CAWS Spec Validator
//!
//! Validates working specs against structural and tier-specific rules and
//! proposes corrections for what it finds.
//!
//! Validation is a pure function of the spec document and the policy tier
//! table. It never reads files; the host loads the policy and hands it in.
//!
//! ## Check order
//!
//! 1. Required top-level fields
//! 2. Shape and enum membership of each field
//! 3. Cross-field rules (unique acceptance ids, literal `scope.out` paths)
//! 4. Tier rules, only once `risk_tier` is a valid 1-3
//! 5. Advisory warnings
//!
//! ## Example
//!
//! ```rust
//! use caws_validator::{AutoFixAdvisor, SpecValidator};
//! use serde_json::json;
//!
//! let validator = SpecValidator::default();
//! let result = validator.validate(&json!({ "id": "FEAT-0001", "risk_tier": 7 }));
//! assert!(!result.passed);
//!
//! let fixes = AutoFixAdvisor::new().suggest_fixes(&result);
//! assert!(fixes.iter().any(|f| f.field == "risk_tier" && f.proposed_value == json!(3)));
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod advisor;
mod checks;
pub mod error;
pub mod path;
pub mod validator;

pub use advisor::{apply_fixes, AutoFixAdvisor};
pub use error::{Result, ValidatorError};
pub use validator::{SpecValidator, ValidateOptions, GLOB_METACHARACTERS, REQUIRED_FIELDS};
