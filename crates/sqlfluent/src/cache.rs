//! Server metadata cache with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Read/write-with-expiry store for server metadata (e.g. the server version
/// a [`crate::PgLink`] detected).
pub trait MetaCache: Send + Sync {
    /// Return a live entry.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store an entry. `None` never expires.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>);

    fn remove(&self, key: &str);
}

/// In-process [`MetaCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: Mutex<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.lock().retain(|_, entry| entry.is_live(now));
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // The map stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetaCache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut map = self.lock();
        let live = map.get(key)?.is_live(Instant::now());
        if !live {
            map.remove(key);
            return None;
        }
        map.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.lock()
            .insert(key.to_string(), Entry { value, expires_at });
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}
