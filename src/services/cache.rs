//! Bounded TTL cache for generated analyses.
//!
//! Injected into the generator as a dependency rather than living in static
//! state, so tests control both time and isolation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::GeneratedAnalysis;

struct CacheEntry {
    value: GeneratedAnalysis,
    inserted: Instant,
}

/// Capacity + TTL bounded cache keyed by a content-derived hash.
pub struct AnalysisCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl AnalysisCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Look up a cached analysis, dropping it if expired.
    pub fn get(&self, key: &str) -> Option<GeneratedAnalysis> {
        self.get_at(key, Instant::now())
    }

    /// Insert an analysis, evicting expired then oldest entries past capacity.
    pub fn insert(&self, key: String, value: GeneratedAnalysis) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<GeneratedAnalysis> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted) < self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert_at(&self, key: String, value: GeneratedAnalysis, now: Instant) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        entries.retain(|_, entry| now.duration_since(entry.inserted) < self.ttl);

        // Still full after dropping expired entries: evict the oldest
        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => entries.remove(&k),
                None => break,
            };
        }

        entries.insert(key, CacheEntry { value, inserted: now });
    }
}
