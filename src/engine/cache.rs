// * Result Cache
// * Memoizes per-document parse results keyed by content hash + option
// * hash. Size-bounded with quality-adaptive expiry: higher average
// * quality earns a longer TTL. Entries are whole-record insert-or-replace
// * and never mutated after insertion.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use xxhash_rust::xxh64::xxh64;

use crate::config::constants::{
    CACHE_QUALITY_HIGH, CACHE_QUALITY_MEDIUM, CACHE_TTL_HIGH_SECS, CACHE_TTL_LOW_SECS,
    CACHE_TTL_MEDIUM_SECS,
};
use crate::refinery::schema::ProductSpecification;

/// Cache key: content hash combined with the options hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(html: &str, options_fingerprint: &str) -> Self {
        Self(xxh64(html.as_bytes(), 0) ^ xxh64(options_fingerprint.as_bytes(), 1))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    specifications: Arc<Vec<ProductSpecification>>,
    stored_at: Instant,
    ttl: Duration,
    last_access: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Process-wide memoization of parse results. Safe for concurrent
/// reads/writes; concurrent identical misses may both do the work
/// (best-effort, no single-flight).
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
}

impl ResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Looks up a live entry, refreshing its access time. Expired entries
    /// are removed on sight.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<ProductSpecification>>> {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        let live = match entries.get(key) {
            Some(entry) => !entry.is_expired(now),
            None => return None,
        };

        if !live {
            entries.remove(key);
            return None;
        }

        entries.get_mut(key).map(|entry| {
            entry.last_access = now;
            Arc::clone(&entry.specifications)
        })
    }

    /// Stores a result with the given TTL. At capacity, the stalest entry
    /// (oldest last access) is evicted first.
    pub fn insert(
        &self,
        key: CacheKey,
        specifications: Vec<ProductSpecification>,
        ttl: Duration,
    ) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let stalest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| *key);
            if let Some(stalest) = stalest {
                entries.remove(&stalest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                specifications: Arc::new(specifications),
                stored_at: now,
                ttl,
                last_access: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// Picks the expiry tier from the mean quality across a parse's tables,
/// bounded above by the caller's configured expiry.
pub fn ttl_for_quality(mean_quality: f64, configured_expiry: Duration) -> Duration {
    let tier = if mean_quality >= CACHE_QUALITY_HIGH {
        Duration::from_secs(CACHE_TTL_HIGH_SECS)
    } else if mean_quality >= CACHE_QUALITY_MEDIUM {
        Duration::from_secs(CACHE_TTL_MEDIUM_SECS)
    } else {
        Duration::from_secs(CACHE_TTL_LOW_SECS)
    };
    tier.min(configured_expiry)
}
