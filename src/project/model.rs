use std::path::{Path, PathBuf};

use crate::assets::source::SourceStore;
use crate::foundation::core::{Point, bounding_rect};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::geometry::transform::{CropGeometry, transform_polygon};
use crate::resample::ResampleFilter;

/// Default atlas density in pixels per meter.
pub const DEFAULT_DENSITY: f64 = 512.0;
/// Default square canvas side in pixels.
pub const DEFAULT_CANVAS_SIZE: u32 = 2048;

/// Identifier of a mask within its texture.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MaskId(pub u32);

/// Closed polygon carved out of one texture, with its physical width.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mask {
    /// Identifier, unique within the owning texture.
    pub id: MaskId,
    /// Polygon vertices in source-image pixels (at least 3).
    pub points: Vec<Point>,
    /// Physical width of the masked region in meters.
    pub real_width: f64,
    /// Pixel width of the polygon's bounding box; the scale denominator.
    pub original_width: f64,
}

impl Mask {
    /// Create a mask, deriving `original_width` from the polygon's bounding box.
    pub fn new(id: MaskId, points: Vec<Point>, real_width: f64) -> TesseraResult<Self> {
        if points.len() < 3 {
            return Err(TesseraError::degenerate(format!(
                "mask needs at least 3 points, got {}",
                points.len()
            )));
        }
        let original_width = bounding_rect(&points)
            .map(|r| r.width())
            .filter(|w| w.is_finite() && *w > 0.0)
            .ok_or_else(|| TesseraError::degenerate("mask bounding box has zero width"))?;
        let mask = Self {
            id,
            points,
            real_width,
            original_width,
        };
        mask.validate()?;
        Ok(mask)
    }

    /// Check point count, widths, and coordinates.
    pub fn validate(&self) -> TesseraResult<()> {
        if self.points.len() < 3 {
            return Err(TesseraError::validation(format!(
                "mask {} has {} points (need >= 3)",
                self.id.0,
                self.points.len()
            )));
        }
        if self.points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(TesseraError::validation(format!(
                "mask {} has non-finite points",
                self.id.0
            )));
        }
        if !self.real_width.is_finite() || self.real_width <= 0.0 {
            return Err(TesseraError::validation(format!(
                "mask {} real_width must be > 0",
                self.id.0
            )));
        }
        if !self.original_width.is_finite() || self.original_width <= 0.0 {
            return Err(TesseraError::validation(format!(
                "mask {} original_width must be > 0",
                self.id.0
            )));
        }
        Ok(())
    }

    /// Target pixels per source pixel at `density`.
    pub fn scale_factor(&self, density: f64) -> f64 {
        (density * self.real_width) / self.original_width
    }

    /// Crop rectangle and clip polygon for this mask at `density`.
    pub fn crop_geometry(&self, density: f64) -> TesseraResult<CropGeometry> {
        transform_polygon(&self.points, self.scale_factor(density))
    }
}

/// A source image reference: path, physical width, and (once read) intrinsic pixel size.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    /// Path as referenced by masks and fragments.
    pub path: PathBuf,
    /// Artist-supplied physical width of the whole image.
    pub real_width_meters: f64,
    /// Intrinsic `(width, height)` in pixels; `None` until the image has been read.
    pub size: Option<(u32, u32)>,
}

impl Texture {
    /// Reference `path` without touching the image.
    pub fn new(path: impl Into<PathBuf>, real_width_meters: f64) -> Self {
        Self {
            path: path.into(),
            real_width_meters,
            size: None,
        }
    }

    /// Load `path` through `store` to read its intrinsic size.
    pub fn open(
        store: &dyn SourceStore,
        path: impl Into<PathBuf>,
        real_width_meters: f64,
    ) -> TesseraResult<Self> {
        let mut texture = Self::new(path, real_width_meters);
        let img = store.load(&texture.path)?;
        texture.size = Some(img.dimensions());
        Ok(texture)
    }
}

impl From<&TextureEntry> for Texture {
    fn from(entry: &TextureEntry) -> Self {
        Self::new(entry.path.clone(), entry.real_width_meters)
    }
}

/// Persisted texture entry with the masks carved from it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextureEntry {
    /// Source image path, relative to the project root unless absolute.
    pub path: PathBuf,
    /// Artist-supplied physical width of the whole image.
    #[serde(default = "default_real_width")]
    pub real_width_meters: f64,
    /// Masks in creation order.
    #[serde(default)]
    pub masks: Vec<Mask>,
}

fn default_real_width() -> f64 {
    1.0
}

impl TextureEntry {
    /// Create an entry without masks.
    pub fn new(path: impl Into<PathBuf>, real_width_meters: f64) -> Self {
        Self {
            path: path.into(),
            real_width_meters,
            masks: Vec::new(),
        }
    }

    /// Look up a mask by id.
    pub fn mask(&self, id: MaskId) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    /// Smallest id not used by any mask of this texture.
    pub fn next_mask_id(&self) -> MaskId {
        MaskId(self.masks.iter().map(|m| m.id.0 + 1).max().unwrap_or(0))
    }

    pub(crate) fn matches(&self, path: &Path) -> bool {
        self.path == path
    }
}

/// Global atlas settings passed into every compositing call.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AtlasConfig {
    /// Pixels per meter.
    pub density: f64,
    /// Square canvas side length in pixels.
    pub canvas_size: u32,
    /// Active resampling filter.
    #[serde(default)]
    pub filter: ResampleFilter,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            canvas_size: DEFAULT_CANVAS_SIZE,
            filter: ResampleFilter::default(),
        }
    }
}

impl AtlasConfig {
    /// Check density, canvas size, and filter parameters.
    pub fn validate(&self) -> TesseraResult<()> {
        validate_density(self.density)?;
        if self.canvas_size == 0 {
            return Err(TesseraError::validation("canvas_size must be > 0"));
        }
        self.filter.validate()
    }
}

pub(crate) fn validate_density(density: f64) -> TesseraResult<()> {
    if !density.is_finite() || density <= 0.0 {
        return Err(TesseraError::validation(format!(
            "density must be finite and > 0, got {density}"
        )));
    }
    Ok(())
}

/// A mask placed on the atlas canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fragment {
    /// Owning texture path.
    pub texture: PathBuf,
    /// Mask id within the texture.
    pub mask: MaskId,
    /// Top-left corner in atlas pixels.
    #[serde(default)]
    pub position: Point,
}

impl Fragment {
    /// Create a fragment at `position`.
    pub fn new(texture: impl Into<PathBuf>, mask: MaskId, position: Point) -> Self {
        Self {
            texture: texture.into(),
            mask,
            position,
        }
    }

    /// On-atlas pixel size of `mask` under `config`.
    pub fn pixel_size(mask: &Mask, config: &AtlasConfig) -> TesseraResult<(u32, u32)> {
        Ok(mask.crop_geometry(config.density)?.target_size())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/model.rs"]
mod tests;
