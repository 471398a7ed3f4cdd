//! Policy cache
//!
//! The only mutable process state in the governance core. It is an explicit
//! object the host constructs once and hands to the store, never a global.
//! Single-writer access is assumed; the lock only keeps readers consistent.

use caws_types::Policy;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default time-to-live for cached policies
pub const DEFAULT_POLICY_TTL_SECS: i64 = 300;

/// Cache contract for loaded policies
pub trait PolicyCache: Send + Sync + fmt::Debug {
    /// Fresh policy for `path`, if cached
    fn get(&self, path: &Path) -> Option<Arc<Policy>>;

    /// Store a freshly loaded policy
    fn set(&self, path: PathBuf, policy: Arc<Policy>);

    /// Drop the entry for `path`. Returns whether an entry existed.
    fn invalidate(&self, path: &Path) -> bool;

    /// Drop every entry
    fn invalidate_all(&self);

    /// Snapshot of the cache contents
    fn status(&self) -> CacheStatus;
}

/// Snapshot returned by [`PolicyCache::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    pub ttl_secs: i64,
    pub entries: Vec<CacheEntryStatus>,
}

impl CacheStatus {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryStatus {
    pub path: PathBuf,
    pub loaded_at: DateTime<Utc>,
    pub age_secs: i64,
    pub fresh: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    policy: Arc<Policy>,
    loaded_at: DateTime<Utc>,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory cache with a time-to-live per entry
pub struct TtlPolicyCache {
    ttl: Duration,
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    clock: Clock,
}

impl TtlPolicyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_ttl_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.loaded_at < self.ttl
    }

    /// Evict a stale entry so status() does not report it forever. A `set`
    /// may land between the read and write locks, so freshness is checked
    /// again under the write lock.
    fn evict_if_stale(&self, path: &Path, now: DateTime<Utc>) -> Option<Arc<Policy>> {
        let mut entries = self.entries.write();
        match entries.get(path) {
            Some(entry) if self.is_fresh(entry, now) => Some(Arc::clone(&entry.policy)),
            Some(_) => {
                entries.remove(path);
                None
            }
            None => None,
        }
    }
}

impl Default for TtlPolicyCache {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_POLICY_TTL_SECS)
    }
}

impl fmt::Debug for TtlPolicyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlPolicyCache")
            .field("ttl_secs", &self.ttl.num_seconds())
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

impl PolicyCache for TtlPolicyCache {
    fn get(&self, path: &Path) -> Option<Arc<Policy>> {
        let now = (self.clock)();
        {
            let entries = self.entries.read();
            match entries.get(path) {
                Some(entry) if self.is_fresh(entry, now) => {
                    return Some(Arc::clone(&entry.policy));
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.evict_if_stale(path, now)
    }

    fn set(&self, path: PathBuf, policy: Arc<Policy>) {
        let entry = CacheEntry {
            policy,
            loaded_at: (self.clock)(),
        };
        self.entries.write().insert(path, entry);
    }

    fn invalidate(&self, path: &Path) -> bool {
        self.entries.write().remove(path).is_some()
    }

    fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    fn status(&self) -> CacheStatus {
        let now = (self.clock)();
        let entries = self.entries.read();
        let mut out: Vec<CacheEntryStatus> = entries
            .iter()
            .map(|(path, entry)| CacheEntryStatus {
                path: path.clone(),
                loaded_at: entry.loaded_at,
                age_secs: (now - entry.loaded_at).num_seconds(),
                fresh: self.is_fresh(entry, now),
            })
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));

        CacheStatus {
            ttl_secs: self.ttl.num_seconds(),
            entries: out,
        }
    }
}
