use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use lru::LruCache;

use crate::foundation::core::RgbaImage;
use crate::foundation::error::{TesseraError, TesseraResult};

/// Provider of decoded source images, keyed by the path a texture references.
///
/// Implementations must return the same pixels for the same path for the lifetime of any
/// cache entry built from them.
pub trait SourceStore: Send + Sync {
    /// Decode (or fetch) the straight RGBA8 pixels for `path`.
    fn load(&self, path: &Path) -> TesseraResult<Arc<RgbaImage>>;
}

/// Decode encoded image bytes into straight (non-premultiplied) RGBA8.
pub fn decode_rgba8(bytes: &[u8]) -> TesseraResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

/// Default number of decoded source images an [`FsSourceStore`] keeps.
pub const DEFAULT_DECODED_SOURCE_CAPACITY: usize = 8;

/// Filesystem-backed store; relative paths resolve against `root`.
///
/// The most recently used decoded images are kept in a bounded LRU; an evicted file is decoded
/// again on its next load.
#[derive(Debug)]
pub struct FsSourceStore {
    root: PathBuf,
    decoded: Mutex<LruCache<PathBuf, Arc<RgbaImage>>>,
    decode_counts: Mutex<HashMap<PathBuf, u64>>,
}

impl FsSourceStore {
    /// Create a store resolving relative paths against `root`, keeping
    /// [`DEFAULT_DECODED_SOURCE_CAPACITY`] decoded images.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_lru(
            root.into(),
            NonZeroUsize::new(DEFAULT_DECODED_SOURCE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        )
    }

    /// Like [`FsSourceStore::new`] but keeping at most `capacity` decoded images.
    pub fn with_capacity(root: impl Into<PathBuf>, capacity: usize) -> TesseraResult<Self> {
        let cap = NonZeroUsize::new(capacity)
            .ok_or_else(|| TesseraError::validation("decoded source capacity must be > 0"))?;
        Ok(Self::with_lru(root.into(), cap))
    }

    fn with_lru(root: PathBuf, cap: NonZeroUsize) -> Self {
        Self {
            root,
            decoded: Mutex::new(LruCache::new(cap)),
            decode_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Maximum number of decoded images kept.
    pub fn capacity(&self) -> usize {
        self.decoded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cap()
            .get()
    }

    /// Resolution root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute or root-relative location of `path`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// How many times `path` was decoded from disk.
    pub fn decode_count(&self, path: &Path) -> u64 {
        self.decode_counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Forget memoized pixels (e.g. after the artist replaced a file on disk).
    pub fn invalidate(&self) {
        self.decoded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn read_and_decode(&self, path: &Path) -> TesseraResult<RgbaImage> {
        let full = self.resolve(path);
        let bytes = std::fs::read(&full).map_err(|e| {
            TesseraError::source_unavailable(path, format!("read '{}': {e}", full.display()))
        })?;
        decode_rgba8(&bytes).map_err(|e| TesseraError::source_unavailable(path, format!("{e:#}")))
    }
}

impl SourceStore for FsSourceStore {
    fn load(&self, path: &Path) -> TesseraResult<Arc<RgbaImage>> {
        let mut decoded = self.decoded.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(img) = decoded.get(path) {
            return Ok(Arc::clone(img));
        }

        let img = Arc::new(self.read_and_decode(path)?);
        *self
            .decode_counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(path.to_path_buf())
            .or_insert(0) += 1;
        tracing::debug!(
            path = %path.display(),
            w = img.width(),
            h = img.height(),
            "decoded source image"
        );
        if let Some((evicted, _)) = decoded.push(path.to_path_buf(), Arc::clone(&img))
            && evicted != path
        {
            tracing::debug!(path = %evicted.display(), "evicted decoded source image");
        }
        Ok(img)
    }
}

/// In-memory store for embedding callers that already hold decoded pixels.
#[derive(Debug, Default)]
pub struct MemorySourceStore {
    images: HashMap<PathBuf, Arc<RgbaImage>>,
}

impl MemorySourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the pixels for `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: RgbaImage) {
        self.images.insert(path.into(), Arc::new(image));
    }

    /// Builder-style [`MemorySourceStore::insert`].
    pub fn with(mut self, path: impl Into<PathBuf>, image: RgbaImage) -> Self {
        self.insert(path, image);
        self
    }
}

impl SourceStore for MemorySourceStore {
    fn load(&self, path: &Path) -> TesseraResult<Arc<RgbaImage>> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| TesseraError::source_unavailable(path, "not registered"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
