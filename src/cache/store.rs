//! Generic key/value store with per-key-class time-to-live
//!
//! Keys carry a class prefix ("predictions:...", "rosters:...") that selects a
//! default TTL when none is explicit. Expiry is lazy: a read past TTL is
//! equivalent to absence and evicts the entry. Writes are last-writer-wins;
//! the orchestrator is the sole writer per run, so no versioning is needed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// TTL class inferred from a key's prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    /// Prediction data; predictions update periodically upstream
    Predictions,
    /// Roster/ownership data; ownership changes are the most time-sensitive signal
    Rosters,
    /// Identity matches; a correct match is stable for a season
    Matches,
    /// Conversion ratios; rulesets are edited rarely
    Ratios,
    /// Anything without a recognized prefix
    Default,
}

impl KeyClass {
    /// Infer the class from the key's leading segment
    pub fn infer(key: &str) -> Self {
        let prefix = key.split(':').next().unwrap_or("");
        match prefix {
            "predictions" => KeyClass::Predictions,
            "rosters" => KeyClass::Rosters,
            "matches" => KeyClass::Matches,
            "ratios" => KeyClass::Ratios,
            _ => KeyClass::Default,
        }
    }

    /// Default TTL for this class
    pub fn ttl(&self) -> Duration {
        match self {
            KeyClass::Predictions => Duration::from_secs(10 * 60),
            KeyClass::Rosters => Duration::from_secs(2 * 60),
            KeyClass::Matches => Duration::from_secs(24 * 60 * 60),
            KeyClass::Ratios => Duration::from_secs(7 * 24 * 60 * 60),
            KeyClass::Default => Duration::from_secs(5 * 60),
        }
    }

    /// Label used in metrics
    pub fn label(&self) -> &'static str {
        match self {
            KeyClass::Predictions => "predictions",
            KeyClass::Rosters => "rosters",
            KeyClass::Matches => "matches",
            KeyClass::Ratios => "ratios",
            KeyClass::Default => "default",
        }
    }
}

/// Opaque payload plus creation instant plus TTL
#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Counters for cache behavior, surfaced via metrics and `/stats`
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// In-memory TTL cache shared across pipeline runs
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl TtlCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a payload by key, treating an expired entry as absent and evicting it
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let expired = {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("Cache read lock poisoned, treating '{}' as absent", key);
                    return None;
                }
            };

            match entries.get(key) {
                Some(entry) if !entry.is_expired() => {
                    let value = serde_json::from_value(entry.value.clone()).ok();
                    if value.is_some() {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                    } else {
                        warn!("Cache payload for '{}' failed to deserialize", key);
                        self.misses.fetch_add(1, Ordering::Relaxed);
                    }
                    return value;
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            if let Ok(mut entries) = self.entries.write() {
                // Re-check under the write lock; another run may have refreshed it
                if entries.get(key).is_some_and(|e| e.is_expired()) {
                    entries.remove(key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!("Evicted expired cache entry '{}'", key);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a payload under the key-class default TTL
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> crate::error::Result<()> {
        self.set_with_ttl(key, value, KeyClass::infer(key).ttl())
    }

    /// Store a payload with an explicit TTL
    pub fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> crate::error::Result<()> {
        let value = serde_json::to_value(value).map_err(|e| {
            crate::error::PipelineError::InternalError {
                message: format!("Failed to serialize cache payload for '{}': {}", key, e),
            }
        })?;

        let mut entries =
            self.entries
                .write()
                .map_err(|_| crate::error::PipelineError::InternalError {
                    message: "Failed to acquire cache write lock".to_string(),
                })?;

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );

        Ok(())
    }

    /// Remove a key regardless of expiry; returns whether it was present
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Drop all expired entries; permitted periodic cleanup, never required
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let purged = before - entries.len();
        if purged > 0 {
            self.evictions.fetch_add(purged as u64, Ordering::Relaxed);
            debug!("Purged {} expired cache entries", purged);
        }
        purged
    }

    /// Current entry count, including not-yet-evicted expired entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of hit/miss/eviction counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_class_inference() {
        assert_eq!(KeyClass::infer("predictions:all"), KeyClass::Predictions);
        assert_eq!(KeyClass::infer("rosters:league-1"), KeyClass::Rosters);
        assert_eq!(KeyClass::infer("matches:p42"), KeyClass::Matches);
        assert_eq!(KeyClass::infer("ratios:classic"), KeyClass::Ratios);
        assert_eq!(KeyClass::infer("report:classic"), KeyClass::Default);
        assert_eq!(KeyClass::infer(""), KeyClass::Default);
    }

    #[test]
    fn test_class_ttls_ordered_by_volatility() {
        assert!(KeyClass::Rosters.ttl() < KeyClass::Predictions.ttl());
        assert!(KeyClass::Predictions.ttl() < KeyClass::Matches.ttl());
        assert!(KeyClass::Matches.ttl() < KeyClass::Ratios.ttl());
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let cache = TtlCache::new();
        cache.set("rosters:test", &vec![1u32, 2, 3]).unwrap();

        let value: Option<Vec<u32>> = cache.get("rosters:test");
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_missing_key_is_absent() {
        let cache = TtlCache::new();
        let value: Option<String> = cache.get("rosters:nothing");
        assert!(value.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        let cache = TtlCache::new();
        cache
            .set_with_ttl("predictions:stale", &"payload", Duration::from_millis(10))
            .unwrap();
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(20));

        let value: Option<String> = cache.get("predictions:stale");
        assert!(value.is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = TtlCache::new();
        cache.set("rosters:key", &"first").unwrap();
        cache.set("rosters:key", &"second").unwrap();

        let value: Option<String> = cache.get("rosters:key");
        assert_eq!(value.as_deref(), Some("second"));
    }

    #[test]
    fn test_invalidate() {
        let cache = TtlCache::new();
        cache.set("ratios:classic", &1.1f64).unwrap();

        assert!(cache.invalidate("ratios:classic"));
        assert!(!cache.invalidate("ratios:classic"));
        let value: Option<f64> = cache.get("ratios:classic");
        assert!(value.is_none());
    }

    #[test]
    fn test_purge_expired() {
        let cache = TtlCache::new();
        cache
            .set_with_ttl("a", &1u32, Duration::from_millis(5))
            .unwrap();
        cache.set("matches:keep", &2u32).unwrap();

        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        let kept: Option<u32> = cache.get("matches:keep");
        assert_eq!(kept, Some(2));
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                let key = format!("rosters:{}", i % 2);
                cache.set(&key, &i).unwrap();
                let _: Option<i32> = cache.get(&key);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 2);
    }
}
