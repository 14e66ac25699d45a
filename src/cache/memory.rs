//! In-memory response cache with TTL and expiry-order eviction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::Cache;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Shared hit/miss counters, updated under the callers' shared ownership
/// rather than process-wide state.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    tokens_used: usize,
    expires_at: Instant,
}

/// Bounded map of raw LLM responses keyed by text fingerprint.
///
/// Entries expire after `ttl` (default 24h). When at capacity, the entry
/// with the earliest expiry is evicted; with a uniform TTL that is the
/// oldest write, not the least recently used. A background sweep purges
/// expired entries hourly under the same lock as foreground operations.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    max_entries: usize,
    ttl: Duration,
    metrics: Arc<CacheMetrics>,
}

impl MemoryCache {
    /// Create a cache. `max_entries == 0` means unbounded;
    /// a zero `ttl` falls back to the 24h default.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
            ttl,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Sum of tokens recorded against live entries, i.e. tokens a hit
    /// would save re-spending.
    pub fn tokens_cached(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.values().map(|entry| entry.tokens_used).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Drop every expired entry. Called by the hourly sweeper so
    /// write-once/never-read keys do not accumulate.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("cache sweep removed {removed} expired entries");
        }
    }

    /// Spawn the hourly background sweep for this cache handle.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                cache.purge_expired();
            }
        })
    }

    fn evict_earliest_expiry(entries: &mut HashMap<String, Entry>) {
        if let Some(key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone())
        {
            entries.remove(&key);
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.metrics.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.metrics.record_miss();
                None
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    fn set(&self, key: &str, value: String, tokens_used: usize) {
        let mut entries = self.entries.lock().unwrap();
        if self.max_entries > 0
            && entries.len() >= self.max_entries
            && !entries.contains_key(key)
        {
            Self::evict_earliest_expiry(&mut entries);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                tokens_used,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}
