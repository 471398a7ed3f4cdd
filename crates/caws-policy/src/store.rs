//! Policy store
//!
//! Loading never throws for expected outcomes: a missing file is
//! `NotFound`, a malformed one is `Invalid` with the exact path and field
//! to fix. The default-policy fallback is an explicit step in
//! [`PolicyStore::resolve`].

use crate::cache::PolicyCache;
use crate::error::PolicyError;
use crate::validate::validate_policy_document;
use async_trait::async_trait;
use caws_types::{parse_document, DocumentFormat, Finding, FindingKind, Policy};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of loading a policy file
#[derive(Debug, Clone)]
pub enum PolicyLoadResult {
    Found(Arc<Policy>),
    NotFound { path: PathBuf },
    Invalid(PolicyError),
}

impl PolicyLoadResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn policy(&self) -> Option<&Arc<Policy>> {
        match self {
            Self::Found(policy) => Some(policy),
            _ => None,
        }
    }
}

/// Where a resolved policy came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicySource {
    File { path: PathBuf },
    BuiltInDefault { missing_path: PathBuf },
}

/// A usable policy, with the warning to surface when it is the default
#[derive(Debug, Clone)]
pub struct PolicyResolution {
    pub policy: Arc<Policy>,
    pub source: PolicySource,
    pub warning: Option<Finding>,
}

impl PolicyResolution {
    pub fn is_default(&self) -> bool {
        matches!(self.source, PolicySource::BuiltInDefault { .. })
    }
}

/// Loads governing policy documents
#[async_trait]
pub trait PolicyStore: Send + Sync + std::fmt::Debug {
    /// Load and validate the policy at `path`
    async fn load(&self, path: &Path) -> PolicyLoadResult;

    /// Load the policy, substituting the built-in default when the file is
    /// absent. A malformed file is still an error.
    async fn resolve(&self, path: &Path) -> Result<PolicyResolution, PolicyError> {
        match self.load(path).await {
            PolicyLoadResult::Found(policy) => Ok(PolicyResolution {
                policy,
                source: PolicySource::File {
                    path: path.to_path_buf(),
                },
                warning: None,
            }),
            PolicyLoadResult::NotFound { path } => {
                warn!(
                    path = %path.display(),
                    "Policy file not found, using built-in default policy"
                );
                let warning = Finding::new(
                    FindingKind::Policy,
                    "policy.not_found",
                    "policy",
                    format!(
                        "No policy found at {}; using built-in default budgets",
                        path.display()
                    ),
                    format!(
                        "Create {} to set project-specific tier budgets",
                        path.display()
                    ),
                );
                Ok(PolicyResolution {
                    policy: Arc::new(Policy::default_policy()),
                    source: PolicySource::BuiltInDefault { missing_path: path },
                    warning: Some(warning),
                })
            }
            PolicyLoadResult::Invalid(err) => Err(err),
        }
    }
}

/// Policy store backed by YAML/JSON files and a shared cache
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    cache: Arc<dyn PolicyCache>,
}

impl FilePolicyStore {
    pub fn new(cache: Arc<dyn PolicyCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<dyn PolicyCache> {
        &self.cache
    }

    /// Parse and validate policy text. Exposed for callers that already
    /// hold the file contents.
    pub fn parse(path: &Path, text: &str) -> Result<Policy, PolicyError> {
        let doc = parse_document(text, DocumentFormat::from_path(path)).map_err(|e| {
            PolicyError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let violations = validate_policy_document(&doc);
        if !violations.is_empty() {
            return Err(PolicyError::Invalid {
                path: path.to_path_buf(),
                violations,
            });
        }

        serde_json::from_value(doc).map_err(|e| PolicyError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn load(&self, path: &Path) -> PolicyLoadResult {
        if let Some(policy) = self.cache.get(path) {
            debug!(path = %path.display(), "Policy cache hit");
            return PolicyLoadResult::Found(policy);
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Policy file absent");
                return PolicyLoadResult::NotFound {
                    path: path.to_path_buf(),
                };
            }
            Err(e) => {
                return PolicyLoadResult::Invalid(PolicyError::Unreadable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        match Self::parse(path, &text) {
            Ok(policy) => {
                let policy = Arc::new(policy);
                self.cache.set(path.to_path_buf(), Arc::clone(&policy));
                debug!(
                    path = %path.display(),
                    version = %policy.version,
                    tiers = policy.risk_tiers.len(),
                    "Policy loaded"
                );
                PolicyLoadResult::Found(policy)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Policy file rejected");
                PolicyLoadResult::Invalid(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlPolicyCache;
    use caws_types::RiskTier;
    use tempfile::TempDir;

    const POLICY_YAML: &str = r#"
version: 1
risk_tiers:
  1:
    max_files: 10
    max_loc: 400
    coverage_threshold: 95
  2:
    max_files: 40
    max_loc: 1500
waiver_approval:
  required_approvers: 2
"#;

    fn store() -> FilePolicyStore {
        FilePolicyStore::new(Arc::new(TtlPolicyCache::default()))
    }

    #[tokio::test]
    async fn test_load_valid_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, POLICY_YAML).unwrap();

        let result = store().load(&path).await;
        let policy = result.policy().unwrap();
        assert_eq!(policy.version, "1");
        assert_eq!(policy.tier(RiskTier::Critical).unwrap().max_loc, 400);
        assert_eq!(policy.required_approvers(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");

        match store().load(&path).await {
            PolicyLoadResult::NotFound { path: missing } => assert_eq!(missing, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_falls_back_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");

        let resolution = store().resolve(&path).await.unwrap();
        assert!(resolution.is_default());
        assert_eq!(
            resolution.policy.tier(RiskTier::Standard).unwrap().max_files,
            50
        );
        let warning = resolution.warning.unwrap();
        assert_eq!(warning.code, "policy.not_found");
        assert!(!warning.suggestion.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_policy_is_invalid_with_field_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(
            &path,
            "version: 1\nrisk_tiers:\n  2:\n    max_files: 0\n    max_loc: 100\n",
        )
        .unwrap();

        let err = store().resolve(&path).await.unwrap_err();
        assert_eq!(err.path(), &path);
        assert_eq!(err.violations()[0].field, "risk_tiers.2.max_files");
    }

    #[tokio::test]
    async fn test_syntax_error_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, "{\"version\": ").unwrap();

        match store().load(&path).await {
            PolicyLoadResult::Invalid(PolicyError::Parse { .. }) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_load_hits_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, POLICY_YAML).unwrap();

        let store = store();
        let first = store.load(&path).await.policy().cloned().unwrap();

        // The cached object survives the file disappearing.
        std::fs::remove_file(&path).unwrap();
        let second = store.load(&path).await.policy().cloned().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(store.cache().invalidate(&path));
        assert!(!store.load(&path).await.is_found());
    }

    #[tokio::test]
    async fn test_invalid_policy_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, "version: 1\nrisk_tiers: []\n").unwrap();

        let store = store();
        assert!(matches!(store.load(&path).await, PolicyLoadResult::Invalid(_)));
        assert!(store.cache().status().is_empty());
    }
}
