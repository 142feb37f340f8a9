//! Bounded LRU cache for compression results.
//!
//! Keyed by a normalized-text fingerprint (trimmed, lower-cased,
//! whitespace-collapsed input). Capacity is bounded; the least recently
//! used entry is evicted once it fills.
//!
//! All access is serialized behind `tokio::sync::RwLock` so the engine
//! can be shared across tasks.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::models::CompressedText;

/// Default number of cached results before eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Snapshot of cache contents and performance counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Normalized keys currently cached, most recently used first.
    pub entries: Vec<String>,
}

/// Pure function from raw input to cache key.
pub fn cache_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Result cache owned by one engine instance.
pub struct ResultCache {
    entries: RwLock<LruCache<String, CompressedText>>,
    counters: RwLock<Counters>,
    capacity: usize,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("capacity must be > 0"),
            )),
            counters: RwLock::new(Counters {
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Look up a cached result for the given raw input.
    pub async fn get(&self, text: &str) -> Option<CompressedText> {
        let key = cache_key(text);
        let mut entries = self.entries.write().await;
        let result = entries.get(&key).cloned();

        let mut counters = self.counters.write().await;
        match result {
            Some(_) => counters.hits += 1,
            None => counters.misses += 1,
        }
        result
    }

    /// Store a computed result under the input's normalized key.
    pub async fn put(&self, text: &str, result: CompressedText) {
        let key = cache_key(text);
        let mut entries = self.entries.write().await;
        if let Some((evicted_key, _)) = entries.push(key.clone(), result) {
            if evicted_key != key {
                let mut counters = self.counters.write().await;
                counters.evictions += 1;
            }
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let counters = self.counters.read().await;
        CacheStats {
            size: entries.len(),
            capacity: self.capacity,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            entries: entries.iter().map(|(key, _)| key.clone()).collect(),
        }
    }
}
