//! Client-side cache of blocking decisions.
//!
//! A page load asks about the same URLs over and over; a hit here skips
//! the IPC round trip entirely. Any call that can change filter state
//! clears the cache wholesale, so entries never outlive the rules they
//! were computed from.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Default entry cap; beyond it the cache resets.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Map from request URL to the engine's block decision.
pub struct DecisionCache {
    entries: Mutex<FxHashMap<String, bool>>,
    capacity: usize,
}

impl DecisionCache {
    /// Creates a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            capacity,
        }
    }

    /// Returns the cached decision for `url`, if any.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<bool> {
        self.entries.lock().get(url).copied()
    }

    /// Records a decision. A full cache is reset rather than evicted
    /// entry by entry; the working set rebuilds within one page load.
    pub fn insert(&self, url: &str, blocked: bool) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains_key(url) {
            entries.clear();
        }
        entries.insert(url.to_string(), blocked);
    }

    /// Drops every cached decision.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_insert_clear() {
        let cache = DecisionCache::default();
        assert_eq!(cache.get("http://ads.example/x"), None);

        cache.insert("http://ads.example/x", true);
        cache.insert("http://example.com/y", false);
        assert_eq!(cache.get("http://ads.example/x"), Some(true));
        assert_eq!(cache.get("http://example.com/y"), Some(false));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("http://ads.example/x"), None);
    }

    #[test]
    fn test_overwrite_updates_decision() {
        let cache = DecisionCache::default();
        cache.insert("http://example.com/a", true);
        cache.insert("http://example.com/a", false);
        assert_eq!(cache.get("http://example.com/a"), Some(false));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_full_cache_resets() {
        let cache = DecisionCache::new(2);
        cache.insert("a", true);
        cache.insert("b", true);
        cache.insert("c", true);
        // The reset dropped the old entries; the new one is present.
        assert_eq!(cache.get("c"), Some(true));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
    }
}
