//! Presence-only cache with a fixed time-to-live.
//!
//! Entries expire lazily: a lookup that finds a stale entry removes it and
//! reports a miss. Writes sweep the whole map once it grows past a threshold,
//! so no background task is needed.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

const SWEEP_THRESHOLD: usize = 1024;

/// Concurrent set of keys that each expire `ttl` after insertion.
///
/// # Example
///
/// ```
/// use cfgate_middleware::TtlCache;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = TtlCache::new(Duration::from_secs(120));
/// cache.insert("alice");
/// assert!(cache.contains(&"alice"));
/// assert!(!cache.contains(&"bob"));
/// # }
/// ```
#[derive(Debug)]
pub struct TtlCache<K: Eq + Hash> {
    entries: DashMap<K, Instant>,
    ttl: Duration,
}

impl<K: Eq + Hash> TtlCache<K> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// The configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns `true` if `key` was inserted less than `ttl` ago.
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        if let Some(expires_at) = self.entries.get(key).map(|e| *e.value()) {
            if now < expires_at {
                return true;
            }
            self.entries.remove_if(key, |_, at| *at <= now);
        }
        false
    }

    /// Inserts `key`, restarting its time-to-live.
    pub fn insert(&self, key: K) {
        let now = Instant::now();
        if self.entries.len() >= SWEEP_THRESHOLD {
            self.entries.retain(|_, expires_at| *expires_at > now);
        }
        self.entries.insert(key, now + self.ttl);
    }

    /// Number of stored entries, expired ones included until swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
