//! Gate configuration

use crate::error::{GateError, Result};
use caws_policy::DEFAULT_POLICY_TTL_SECS;
use caws_types::DEFAULT_REQUIRED_APPROVERS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the config file, relative to the project root
pub const CONFIG_FILE: &str = ".caws/gate.toml";

/// Gate configuration, read from `<project>/.caws/gate.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Policy document, relative to the project root unless absolute
    pub policy_path: PathBuf,

    /// Directory holding one file per waiver
    pub waivers_dir: PathBuf,

    /// Time-to-live of cached policies
    pub policy_cache_ttl_secs: u64,

    /// Approvals a waiver needs when the policy does not say
    pub default_required_approvers: u32,

    /// Treat a change larger than its budget as an error rather than a
    /// warning
    pub fail_on_budget_overrun: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            policy_path: PathBuf::from(".caws/policy.yaml"),
            waivers_dir: PathBuf::from(".caws/waivers"),
            policy_cache_ttl_secs: DEFAULT_POLICY_TTL_SECS.unsigned_abs(),
            default_required_approvers: DEFAULT_REQUIRED_APPROVERS,
            fail_on_budget_overrun: true,
        }
    }
}

impl GateConfig {
    /// Load `<project_root>/.caws/gate.toml`, defaults when absent
    pub fn load(project_root: &Path) -> Result<Self> {
        Self::load_from(&project_root.join(CONFIG_FILE))
    }

    /// Load a config file, defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| GateError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: GateConfig = toml::from_str(&contents).map_err(|e| GateError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if config.default_required_approvers == 0 {
            return Err(GateError::Config {
                path: path.to_path_buf(),
                reason: "default_required_approvers must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    pub fn with_policy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = path.into();
        self
    }

    pub fn with_waivers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.waivers_dir = dir.into();
        self
    }

    pub fn with_policy_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.policy_cache_ttl_secs = secs;
        self
    }

    pub fn with_default_required_approvers(mut self, approvers: u32) -> Self {
        self.default_required_approvers = approvers.max(1);
        self
    }

    pub fn with_fail_on_budget_overrun(mut self, fail: bool) -> Self {
        self.fail_on_budget_overrun = fail;
        self
    }

    pub fn policy_path_in(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.policy_path)
    }

    pub fn waivers_dir_in(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.waivers_dir)
    }

    /// Cache TTL in whole seconds, saturated to the cache's range
    pub fn cache_ttl_secs(&self) -> i64 {
        i64::try_from(self.policy_cache_ttl_secs).unwrap_or(i64::MAX)
    }
}
