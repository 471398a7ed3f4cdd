//! Waiver stores

use crate::error::{Result, WaiverLoadError};
use crate::validate::{validate_waiver_document, WaiverViolation};
use async_trait::async_trait;
use caws_types::{is_valid_waiver_id, parse_document, DocumentFormat, Waiver};
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions tried, in order, for `<dir>/<id>.<ext>`
pub const WAIVER_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Waivers loaded for a set of ids, plus the ones that were skipped
#[derive(Debug, Clone, Default)]
pub struct WaiverBatch {
    pub waivers: Vec<Waiver>,
    pub failures: Vec<WaiverLoadError>,
}

/// Loads waivers by id
#[async_trait]
pub trait WaiverStore: Send + Sync + std::fmt::Debug {
    /// Load a waiver, reporting why it could not be used
    async fn load_detailed(&self, id: &str) -> Result<Waiver>;

    /// Load a waiver. Missing or malformed waivers yield `None` and the
    /// reason is logged.
    async fn load(&self, id: &str) -> Option<Waiver> {
        match self.load_detailed(id).await {
            Ok(waiver) => Some(waiver),
            Err(err) => {
                warn!(waiver_id = %id, code = err.code(), error = %err, "Skipping waiver");
                None
            }
        }
    }

    /// Load every id, keeping failures instead of stopping at the first one
    async fn load_many(&self, ids: &[String]) -> WaiverBatch {
        let mut batch = WaiverBatch::default();
        for id in ids {
            match self.load_detailed(id).await {
                Ok(waiver) => batch.waivers.push(waiver),
                Err(err) => {
                    warn!(waiver_id = %id, code = err.code(), error = %err, "Skipping waiver");
                    batch.failures.push(err);
                }
            }
        }
        batch
    }
}

/// Turn a parsed document into a waiver, checking structure and id
fn waiver_from_document(expected_id: &str, doc: Value) -> Result<Waiver> {
    let violations = validate_waiver_document(&doc);
    if !violations.is_empty() {
        return Err(WaiverLoadError::Invalid {
            id: expected_id.to_string(),
            violations,
        });
    }

    let waiver: Waiver = serde_json::from_value(doc).map_err(|e| WaiverLoadError::Invalid {
        id: expected_id.to_string(),
        violations: vec![WaiverViolation::new("$", e.to_string())],
    })?;

    if waiver.id != expected_id {
        return Err(WaiverLoadError::IdMismatch {
            expected: expected_id.to_string(),
            found: waiver.id,
        });
    }

    Ok(waiver)
}

fn check_requested_id(id: &str) -> Result<()> {
    if is_valid_waiver_id(id) {
        Ok(())
    } else {
        Err(WaiverLoadError::Invalid {
            id: id.to_string(),
            violations: vec![WaiverViolation::new(
                "id",
                "requested id does not match WV-NNNN",
            )],
        })
    }
}

/// One document per waiver under a directory
#[derive(Debug, Clone)]
pub struct FileWaiverStore {
    dir: PathBuf,
}

impl FileWaiverStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate paths for an id, in lookup order
    pub fn candidate_paths(&self, id: &str) -> Vec<PathBuf> {
        WAIVER_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{id}.{ext}")))
            .collect()
    }
}

#[async_trait]
impl WaiverStore for FileWaiverStore {
    async fn load_detailed(&self, id: &str) -> Result<Waiver> {
        // Also keeps ids from escaping the waiver directory.
        check_requested_id(id)?;

        for path in self.candidate_paths(id) {
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(WaiverLoadError::Unreadable {
                        path,
                        reason: e.to_string(),
                    })
                }
            };

            let doc = parse_document(&text, DocumentFormat::from_path(&path)).map_err(|e| {
                WaiverLoadError::Parse {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?;

            let waiver = waiver_from_document(id, doc)?;
            debug!(
                waiver_id = %id,
                path = %path.display(),
                status = waiver.status.as_str(),
                "Waiver loaded"
            );
            return Ok(waiver);
        }

        debug!(waiver_id = %id, dir = %self.dir.display(), "No waiver file");
        Err(WaiverLoadError::NotFound { id: id.to_string() })
    }
}

/// Waiver documents held in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryWaiverStore {
    documents: HashMap<String, Value>,
}

impl InMemoryWaiverStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw document; it is validated on load like a file would be
    pub fn with_document(mut self, id: impl Into<String>, doc: Value) -> Self {
        self.documents.insert(id.into(), doc);
        self
    }

    pub fn with_waiver(self, waiver: &Waiver) -> Self {
        let doc = serde_json::to_value(waiver).unwrap_or(Value::Null);
        self.with_document(waiver.id.clone(), doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl WaiverStore for InMemoryWaiverStore {
    async fn load_detailed(&self, id: &str) -> Result<Waiver> {
        check_requested_id(id)?;
        let doc = self
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| WaiverLoadError::NotFound { id: id.to_string() })?;
        waiver_from_document(id, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caws_types::{BudgetDelta, WaiverReason, WaiverStatus, BUDGET_LIMIT_GATE};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    const WAIVER_YAML: &str = r#"
id: WV-0001
title: Payments SDK bump touches generated clients
reason: third_party_constraint
status: active
gates: [budget_limit]
approvers: [tech-lead, security]
expires_at: 2030-06-30T00:00:00Z
delta:
  max_files: 10
"#;

    #[tokio::test]
    async fn test_load_yaml_waiver() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("WV-0001.yaml"), WAIVER_YAML).unwrap();

        let store = FileWaiverStore::new(dir.path());
        let waiver = store.load("WV-0001").await.unwrap();
        assert_eq!(waiver.reason, WaiverReason::ThirdPartyConstraint);
        assert_eq!(waiver.status, WaiverStatus::Active);
        assert!(waiver.covers_gate(BUDGET_LIMIT_GATE));
        assert_eq!(
            waiver.delta_or_zero(),
            BudgetDelta {
                max_files: 10,
                max_loc: 0
            }
        );
        assert_eq!(
            waiver.expires_at,
            Utc.with_ymd_and_hms(2030, 6, 30, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_json_extension_fallback() {
        let dir = TempDir::new().unwrap();
        let doc = json!({
            "id": "WV-0002",
            "title": "Hotfix",
            "reason": "emergency_hotfix",
            "status": "active",
            "gates": ["budget_limit"],
            "approvers": ["oncall"],
            "expires_at": "2030-01-01"
        });
        std::fs::write(dir.path().join("WV-0002.json"), doc.to_string()).unwrap();

        let store = FileWaiverStore::new(dir.path());
        assert!(store.load("WV-0002").await.is_some());
    }

    #[tokio::test]
    async fn test_missing_waiver_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileWaiverStore::new(dir.path());

        assert!(store.load("WV-0404").await.is_none());
        assert_eq!(
            store.load_detailed("WV-0404").await.unwrap_err(),
            WaiverLoadError::NotFound {
                id: "WV-0404".into()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_waiver_is_skipped_not_thrown() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("WV-0003.yaml"),
            WAIVER_YAML
                .replace("WV-0001", "WV-0003")
                .replace("approvers: [tech-lead, security]", "approvers: []"),
        )
        .unwrap();

        let store = FileWaiverStore::new(dir.path());
        assert!(store.load("WV-0003").await.is_none());
        match store.load_detailed("WV-0003").await {
            Err(WaiverLoadError::Invalid { violations, .. }) => {
                assert_eq!(violations[0].field, "approvers");
            }
            other => panic!("expected invalid waiver, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_id_mismatch() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("WV-0009.yaml"), WAIVER_YAML).unwrap();

        let store = FileWaiverStore::new(dir.path());
        assert!(matches!(
            store.load_detailed("WV-0009").await,
            Err(WaiverLoadError::IdMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_path_like_id_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FileWaiverStore::new(dir.path());
        assert!(matches!(
            store.load_detailed("../policy").await,
            Err(WaiverLoadError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_many_keeps_going() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("WV-0001.yaml"), WAIVER_YAML).unwrap();
        std::fs::write(dir.path().join("WV-0002.yaml"), "id: [unclosed").unwrap();

        let store = FileWaiverStore::new(dir.path());
        let ids = vec!["WV-0002".to_string(), "WV-0001".to_string(), "WV-0005".to_string()];
        let batch = store.load_many(&ids).await;

        assert_eq!(batch.waivers.len(), 1);
        assert_eq!(batch.waivers[0].id, "WV-0001");
        let codes: Vec<_> = batch.failures.iter().map(|f| f.code()).collect();
        assert_eq!(codes, vec!["waiver.parse_error", "waiver.not_found"]);
    }

    #[tokio::test]
    async fn test_in_memory_store_validates() {
        let store = InMemoryWaiverStore::new()
            .with_document("WV-0001", json!({ "id": "WV-0001" }));

        assert_eq!(store.len(), 1);
        assert!(matches!(
            store.load_detailed("WV-0001").await,
            Err(WaiverLoadError::Invalid { .. })
        ));
    }
}
