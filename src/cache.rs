//! Key/value cache with time-to-live, injected wherever a value is derived
//! from configuration and shared across requests.
//!
//! # Design
//!
//! The resolution components never reach for a global cache. They receive a
//! [`CacheStore`] and go through [`remember`], which returns the cached value
//! for a key or computes, stores, and returns it. Values are stored as
//! `serde_json::Value`, so any serializable map round-trips through either
//! backend.
//!
//! Two backends:
//!
//! - [`MemoryCache`]: process-local, used by tests and one-shot commands.
//! - [`FileCache`]: a versioned JSON manifest on disk, shared by every
//!   process pointed at the same site. `lingua-cms cache-clear` flushes it.
//!
//! ## Invalidation
//!
//! Entries expire after their TTL. The file manifest additionally records a
//! SHA-256 fingerprint of the configuration it was built from; loading it
//! under a different configuration yields an empty cache, so editing
//! `cms.toml` never serves stale maps. A [`FileCache`] rereads the manifest
//! whenever the file changes under it, so `cache-clear` from another
//! process reaches a running server.
//!
//! Values are always recomputed whole, never updated in place, so concurrent
//! writers can only race to store identical values.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::SystemTime;
use thiserror::Error;

use crate::config::CmsConfig;

/// Version of the file cache manifest format. Bump to invalidate old files.
const MANIFEST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A stored value and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Cache port consumed by the resolution components.
pub trait CacheStore: Send + Sync {
    /// Fresh value for `key`, if any.
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    /// Store `value` under `key` for `ttl`.
    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration);
    /// Drop one key.
    fn forget(&self, key: &str);
    /// Drop every key.
    fn flush(&self);
}

/// Return the cached value for `key`, or compute it with `producer`, store
/// it for `ttl`, and return it.
///
/// A cached value that no longer deserializes into `T` counts as a miss.
pub fn remember<T, F>(store: &dyn CacheStore, key: &str, ttl: Duration, producer: F) -> T
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    if let Some(value) = store.get(key)
        && let Ok(hit) = serde_json::from_value(value)
    {
        return hit;
    }
    tracing::debug!(key, "cache miss");
    let fresh = producer();
    match serde_json::to_value(&fresh) {
        Ok(value) => store.put(key, value, ttl),
        Err(err) => tracing::warn!(key, error = %err, "value not cacheable"),
    }
    fresh
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Process-local cache.
pub struct MemoryCache<C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: C,
    stats: CacheStats,
}

impl MemoryCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            stats: CacheStats::default(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock> CacheStore for MemoryCache<C> {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();
        let value = self
            .lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone());
        self.stats.record(value.is_some());
        value
    }

    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.lock()
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    fn forget(&self, key: &str) {
        self.lock().remove(key);
    }

    fn flush(&self) {
        self.lock().clear();
    }
}

// =============================================================================
// File backend
// =============================================================================

/// On-disk manifest of cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    /// Fingerprint of the configuration the entries were derived from.
    pub config_hash: String,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    pub fn empty(config_hash: &str) -> Self {
        Self {
            version: MANIFEST_VERSION,
            config_hash: config_hash.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Load from `path`. Returns an empty manifest if the file doesn't
    /// exist, can't be parsed, has another format version, or was built
    /// from a different configuration.
    pub fn load(path: &Path, config_hash: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::empty(config_hash),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(config_hash),
        };
        if manifest.version != MANIFEST_VERSION || manifest.config_hash != config_hash {
            return Self::empty(config_hash);
        }
        manifest
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Modification time and length of the manifest file, `None` when absent.
type FileStamp = Option<(SystemTime, u64)>;

fn file_stamp(path: &Path) -> FileStamp {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

struct FileState {
    manifest: CacheManifest,
    /// Stamp of the file as this process last read or wrote it.
    stamp: FileStamp,
}

/// Cache persisted as a JSON manifest, written through on every change.
pub struct FileCache<C: Clock = SystemClock> {
    path: PathBuf,
    config_hash: String,
    state: Mutex<FileState>,
    clock: C,
}

impl FileCache<SystemClock> {
    pub fn open(path: impl Into<PathBuf>, config_hash: &str) -> Self {
        Self::open_with_clock(path, config_hash, SystemClock)
    }
}

impl<C: Clock> FileCache<C> {
    pub fn open_with_clock(path: impl Into<PathBuf>, config_hash: &str, clock: C) -> Self {
        let path = path.into();
        let state = FileState {
            manifest: CacheManifest::load(&path, config_hash),
            stamp: file_stamp(&path),
        };
        Self {
            path,
            config_hash: config_hash.to_string(),
            state: Mutex::new(state),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through(&self, state: &mut FileState) {
        if let Err(err) = state.manifest.save(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to persist cache");
        }
        state.stamp = file_stamp(&self.path);
    }

    /// Lock the state, first reloading the manifest if another process
    /// rewrote or removed the file.
    fn lock(&self) -> std::sync::MutexGuard<'_, FileState> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = file_stamp(&self.path);
        if stamp != state.stamp {
            tracing::debug!(path = %self.path.display(), "cache file changed on disk, reloading");
            state.manifest = CacheManifest::load(&self.path, &self.config_hash);
            state.stamp = stamp;
        }
        state
    }
}

impl<C: Clock> CacheStore for FileCache<C> {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();
        self.lock()
            .manifest
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut state = self.lock();
        state
            .manifest
            .entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
        self.write_through(&mut state);
    }

    fn forget(&self, key: &str) {
        let mut state = self.lock();
        if state.manifest.entries.remove(key).is_some() {
            self.write_through(&mut state);
        }
    }

    fn flush(&self) {
        let mut state = self.lock();
        state.manifest.entries.clear();
        self.write_through(&mut state);
    }
}

/// SHA-256 fingerprint of a configuration, as a hex string.
pub fn hash_config(config: &CmsConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"cms-config\0");
    // BTreeMap-backed fields serialize in a stable order.
    match serde_json::to_vec(config) {
        Ok(bytes) => hasher.update(&bytes),
        Err(_) => hasher.update(b"unserializable"),
    }
    format!("{:x}", hasher.finalize())
}

/// Hit/miss counters for a cache backend.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU32,
    misses: AtomicU32,
}

impl CacheStats {
    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u32 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hits, {} misses", self.hits(), self.misses())
    }
}
