//! Tessera is an atlas compositing engine: it carves polygon-masked fragments out of source
//! images and packs them onto a shared canvas at a consistent real-world pixel density.
//!
//! # Pipeline overview
//!
//! 1. **Geometry**: mask polygon + scale factor -> crop rectangle and target-space clip polygon
//! 2. **Resample**: crop -> target size through a [`ResampleFilter`] (nearest, Lanczos3, or a
//!    separable Kaiser-windowed sinc)
//! 3. **Cache**: resampled crops are kept in a bounded LRU keyed by everything they depend on
//! 4. **Clip**: anti-aliased polygon coverage is multiplied into alpha
//! 5. **Export**: fragments are composited onto the atlas, then [`flood()`] fills transparent
//!    texels with color pulled from covered neighbours
//!
//! Constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: identical inputs produce bit-identical fragments.
//! - **Straight RGBA8** end-to-end; alpha is never premultiplied into color.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod cache;
mod compose;
mod engine;
mod flood;
mod foundation;
mod geometry;
mod project;
mod resample;

pub use assets::source::{
    DEFAULT_DECODED_SOURCE_CAPACITY, FsSourceStore, MemorySourceStore, SourceStore, decode_rgba8,
};
pub use cache::resample::{
    CacheStats, DEFAULT_RESAMPLE_CACHE_CAPACITY, ResampleCache, ResampleKey, SharedResampleCache,
};
pub use compose::atlas::{AtlasCanvas, over_straight};
pub use compose::fragment::{
    FragmentCompositor, FragmentImage, MAX_FRAGMENT_EXTENT, extract_crop, polygon_coverage,
};
pub use engine::{
    AtlasEngine, AtlasRender, BuiltFragment, EngineOpts, FragmentFailure,
    RESAMPLE_CACHE_CAPACITY_ENV, RebuildReport,
};
pub use flood::{auto_levels, flood, flood_in_place};
pub use foundation::core::{
    BezPath, PixelRect, Point, Rect, RgbaImage, bounding_rect, polygon_path,
};
pub use foundation::error::{TesseraError, TesseraResult};
pub use geometry::transform::{CropGeometry, transform_polygon};
pub use project::file::AtlasProject;
pub use project::model::{
    AtlasConfig, DEFAULT_CANVAS_SIZE, DEFAULT_DENSITY, Fragment, Mask, MaskId, Texture,
    TextureEntry,
};
pub use resample::kaiser::{AxisTaps, KaiserFilter};
pub use resample::{
    DEFAULT_KAISER_BETA, DEFAULT_KAISER_RADIUS, FilterKey, FilterMode, MAX_KAISER_RADIUS,
    ResampleFilter, resample,
};
