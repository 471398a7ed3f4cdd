//! # CAWS Policy Store
//!
//! Loads and validates the project policy document (per-tier budgets and
//! quality thresholds) and keeps loaded policies in an injectable,
//! time-bounded cache.
//!
//! ## Key Components
//!
//! - [`PolicyStore`]: Trait for loading policies
//! - [`FilePolicyStore`]: Reads YAML/JSON policy files through a cache
//! - [`PolicyLoadResult`]: `Found` / `NotFound` / `Invalid`, so the
//!   default-policy fallback is visible in the type
//! - [`PolicyCache`]: Injectable cache contract, [`TtlPolicyCache`] is the
//!   default implementation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use caws_policy::{FilePolicyStore, PolicyLoadResult, PolicyStore, TtlPolicyCache};
//!
//! # async fn example() {
//! let cache = Arc::new(TtlPolicyCache::default());
//! let store = FilePolicyStore::new(cache);
//!
//! match store.load(Path::new(".caws/policy.yaml")).await {
//!     PolicyLoadResult::Found(policy) => println!("policy v{}", policy.version),
//!     PolicyLoadResult::NotFound { path } => println!("no policy at {}", path.display()),
//!     PolicyLoadResult::Invalid(err) => println!("broken policy: {err}"),
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cache;
pub mod error;
pub mod store;
pub mod validate;

pub use cache::{
    CacheEntryStatus, CacheStatus, PolicyCache, TtlPolicyCache, DEFAULT_POLICY_TTL_SECS,
};
pub use error::{PolicyError, Result};
pub use store::{
    FilePolicyStore, PolicyLoadResult, PolicyResolution, PolicySource, PolicyStore,
};
pub use validate::{validate_policy_document, PolicyViolation};
