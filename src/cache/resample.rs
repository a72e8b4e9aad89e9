use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;

use crate::foundation::core::{PixelRect, RgbaImage};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::resample::{FilterKey, ResampleFilter};

/// Default number of resampled crops retained.
pub const DEFAULT_RESAMPLE_CACHE_CAPACITY: usize = 32;

/// Self-describing identity of one resampling request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResampleKey {
    /// Source image path as referenced by the texture.
    pub source: PathBuf,
    /// Crop rectangle in source pixels.
    pub crop: PixelRect,
    /// Target width in pixels.
    pub target_width: u32,
    /// Target height in pixels.
    pub target_height: u32,
    /// Filter mode and rounded parameters.
    pub filter: FilterKey,
}

impl ResampleKey {
    /// Build a key for `filter`, rounding its parameters.
    pub fn new(
        source: impl Into<PathBuf>,
        crop: PixelRect,
        target_width: u32,
        target_height: u32,
        filter: &ResampleFilter,
    ) -> Self {
        Self {
            source: source.into(),
            crop,
            target_width,
            target_height,
            filter: filter.key(),
        }
    }
}

/// Counters describing cache effectiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from a retained entry.
    pub hits: u64,
    /// Requests that ran the compute function.
    pub misses: u64,
    /// Entries dropped to honor the capacity.
    pub evictions: u64,
}

/// Bounded least-recently-used cache of resampled crops.
pub struct ResampleCache {
    entries: LruCache<ResampleKey, Arc<RgbaImage>>,
    stats: CacheStats,
}

impl std::fmt::Debug for ResampleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResampleCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for ResampleCache {
    fn default() -> Self {
        Self {
            entries: LruCache::new(
                NonZeroUsize::new(DEFAULT_RESAMPLE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
            stats: CacheStats::default(),
        }
    }
}

impl ResampleCache {
    /// Create a cache holding at most `capacity` entries (must be > 0).
    pub fn new(capacity: usize) -> TesseraResult<Self> {
        let cap = NonZeroUsize::new(capacity)
            .ok_or_else(|| TesseraError::validation("resample cache capacity must be > 0"))?;
        Ok(Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        })
    }

    /// Return the cached bitmap for `key`, or run `compute`, store, and evict past capacity.
    ///
    /// Compute failures are returned as-is and nothing is stored.
    pub fn get_or_compute<F>(
        &mut self,
        key: ResampleKey,
        compute: F,
    ) -> TesseraResult<Arc<RgbaImage>>
    where
        F: FnOnce() -> TesseraResult<RgbaImage>,
    {
        if let Some(hit) = self.entries.get(&key) {
            self.stats.hits += 1;
            tracing::debug!(
                source = %key.source.display(),
                w = key.target_width,
                h = key.target_height,
                "resample cache hit"
            );
            return Ok(Arc::clone(hit));
        }

        self.stats.misses += 1;
        tracing::debug!(
            source = %key.source.display(),
            w = key.target_width,
            h = key.target_height,
            "resample cache miss"
        );
        let value = Arc::new(compute()?);
        if let Some((evicted, _)) = self.entries.push(key.clone(), Arc::clone(&value))
            && evicted != key
        {
            self.stats.evictions += 1;
            tracing::debug!(source = %evicted.source.display(), "resample cache evicted entry");
        }
        Ok(value)
    }

    /// `true` when `key` is retained (does not touch recency).
    pub fn contains(&self, key: &ResampleKey) -> bool {
        self.entries.contains(key)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "resample cache cleared");
        }
        self.entries.clear();
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Snapshot of hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// [`ResampleCache`] behind a single mutex, shareable across threads.
///
/// The lock is held across the miss-and-compute path, so racing callers with the same key
/// compute at most once.
#[derive(Clone, Debug, Default)]
pub struct SharedResampleCache {
    inner: Arc<Mutex<ResampleCache>>,
}

impl SharedResampleCache {
    /// Wrap an existing cache.
    pub fn new(cache: ResampleCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Create a shared cache with `capacity` entries.
    pub fn with_capacity(capacity: usize) -> TesseraResult<Self> {
        Ok(Self::new(ResampleCache::new(capacity)?))
    }

    /// See [`ResampleCache::get_or_compute`].
    pub fn get_or_compute<F>(&self, key: ResampleKey, compute: F) -> TesseraResult<Arc<RgbaImage>>
    where
        F: FnOnce() -> TesseraResult<RgbaImage>,
    {
        self.lock().get_or_compute(key, compute)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    // A panic inside a compute closure leaves the map itself consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, ResampleCache> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/resample.rs"]
mod tests;
