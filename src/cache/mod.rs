//! Kernel cache for the SMO solver
//!
//! Kernel matrices are symmetric, so K(i, j) and K(j, i) share one entry.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Bytes charged per cached entry: two indices, the value and LRU links
const BYTES_PER_ENTRY: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    i: usize,
    j: usize,
}

impl CacheKey {
    fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self { i, j }
        } else {
            Self { i: j, j: i }
        }
    }
}

/// LRU cache of kernel values keyed by sample index pairs
pub struct KernelCache {
    cache: LruCache<CacheKey, f64>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cache sized from a memory budget in bytes
    pub fn with_memory_limit(memory_bytes: usize) -> Self {
        Self::new(memory_bytes / BYTES_PER_ENTRY)
    }

    /// Cache sized from a memory budget but never larger than the full
    /// triangular kernel matrix of `n_samples`
    pub fn for_problem(memory_bytes: usize, n_samples: usize) -> Self {
        let full_matrix = n_samples.saturating_mul(n_samples + 1) / 2;
        Self::new((memory_bytes / BYTES_PER_ENTRY).min(full_matrix))
    }

    pub fn get(&mut self, i: usize, j: usize) -> Option<f64> {
        let key = CacheKey::new(i, j);
        if let Some(&value) = self.cache.get(&key) {
            self.hits += 1;
            Some(value)
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn put(&mut self, i: usize, j: usize, value: f64) {
        self.cache.put(CacheKey::new(i, j), value);
    }

    /// Cached K(i, j), computing and storing it on a miss
    pub fn get_or_compute<F: FnOnce() -> f64>(&mut self, i: usize, j: usize, compute: F) -> f64 {
        match self.get(i, j) {
            Some(value) => value,
            None => {
                let value = compute();
                self.put(i, j, value);
                value
            }
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(CacheKey::new(1, 5), CacheKey::new(5, 1));
    }

    #[test]
    fn test_symmetric_access() {
        let mut cache = KernelCache::new(3);

        assert_eq!(cache.get(0, 1), None);
        cache.put(0, 1, 5.0);
        assert_eq!(cache.get(1, 0), Some(5.0));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = KernelCache::new(2);

        cache.put(0, 1, 1.0);
        cache.put(1, 2, 2.0);
        cache.put(2, 3, 3.0);

        assert_eq!(cache.get(0, 1), None);
        assert_eq!(cache.get(1, 2), Some(2.0));
        assert_eq!(cache.get(2, 3), Some(3.0));
    }

    #[test]
    fn test_get_or_compute_runs_once() {
        let mut cache = KernelCache::new(4);
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache.get_or_compute(2, 7, || {
                calls += 1;
                0.25
            });
            assert_eq!(value, 0.25);
        }
        assert_eq!(calls, 1);
        assert!((cache.hit_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_memory_limit_never_zero() {
        assert_eq!(KernelCache::with_memory_limit(0).stats().capacity, 1);
        assert_eq!(KernelCache::with_memory_limit(480).stats().capacity, 10);
    }

    #[test]
    fn test_problem_sized_cache() {
        assert_eq!(KernelCache::for_problem(1 << 30, 4).stats().capacity, 10);
        assert_eq!(KernelCache::for_problem(480, 1000).stats().capacity, 10);
    }

    #[test]
    fn test_clear_resets_counters() {
        let mut cache = KernelCache::new(10);
        cache.put(0, 1, 1.0);
        cache.get(0, 1);
        cache.clear();

        assert_eq!(cache.get(0, 1), None);
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 1);
    }
}
