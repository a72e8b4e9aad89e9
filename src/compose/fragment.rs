use std::sync::Arc;

use crate::assets::source::SourceStore;
use crate::cache::resample::{ResampleKey, SharedResampleCache};
use crate::foundation::core::{BezPath, PixelRect, RgbaImage, expect_rgba_len};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::mul_div255_u8;
use crate::geometry::transform::CropGeometry;
use crate::project::model::{AtlasConfig, Mask, Texture, validate_density};
use crate::resample::resample;

/// Largest fragment width or height the coverage rasterizer accepts.
pub const MAX_FRAGMENT_EXTENT: u32 = u16::MAX as u32;

/// A masked, density-scaled fragment bitmap ready to be placed on the atlas.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentImage {
    /// Straight RGBA8 pixels; texels outside the mask polygon are `[0, 0, 0, 0]`.
    pub image: RgbaImage,
    /// Source-space crop the fragment was cut from.
    pub source_rect: PixelRect,
    /// Target pixels per source pixel.
    pub scale_factor: f64,
}

impl FragmentImage {
    /// Width in atlas pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in atlas pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Builds fragment bitmaps from (texture, mask, config) through a shared resample cache.
#[derive(Clone)]
pub struct FragmentCompositor {
    sources: Arc<dyn SourceStore>,
    cache: SharedResampleCache,
}

impl std::fmt::Debug for FragmentCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentCompositor")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl FragmentCompositor {
    /// Create a compositor reading sources from `sources` and caching into `cache`.
    pub fn new(sources: Arc<dyn SourceStore>, cache: SharedResampleCache) -> Self {
        Self { sources, cache }
    }

    /// The resample cache this compositor fills.
    pub fn cache(&self) -> &SharedResampleCache {
        &self.cache
    }

    /// The source store this compositor reads from.
    pub fn sources(&self) -> &Arc<dyn SourceStore> {
        &self.sources
    }

    /// Cut `mask` out of `texture`, resample it for `config`, and clip it to the polygon.
    ///
    /// Identical inputs return bit-identical output; the resampled crop is served from the
    /// cache after the first call.
    #[tracing::instrument(
        skip_all,
        fields(texture = %texture.path.display(), mask = mask.id.0, density = config.density)
    )]
    pub fn build_fragment(
        &self,
        texture: &Texture,
        mask: &Mask,
        config: &AtlasConfig,
    ) -> TesseraResult<FragmentImage> {
        validate_density(config.density)?;
        config.filter.validate()?;

        let geometry = mask.crop_geometry(config.density)?;
        let (tw, th) = geometry.target_size();
        if tw > MAX_FRAGMENT_EXTENT || th > MAX_FRAGMENT_EXTENT {
            return Err(TesseraError::validation(format!(
                "fragment {tw}x{th} exceeds {MAX_FRAGMENT_EXTENT} px"
            )));
        }
        let key = ResampleKey::new(
            texture.path.clone(),
            geometry.source_rect,
            tw,
            th,
            &config.filter,
        );

        let resampled = self.cache.get_or_compute(key, || {
            let src = self.sources.load(&texture.path)?;
            let crop = extract_crop(&src, geometry.source_rect)?;
            resample(&crop, tw, th, &config.filter)
        })?;

        let image = clip_to_polygon(&resampled, &geometry)?;
        tracing::debug!(w = tw, h = th, "built fragment");
        Ok(FragmentImage {
            image,
            source_rect: geometry.source_rect,
            scale_factor: geometry.scale_factor,
        })
    }
}

/// Copy `rect` out of `src`; texels past the image border are transparent.
pub fn extract_crop(src: &RgbaImage, rect: PixelRect) -> TesseraResult<RgbaImage> {
    let (sw, sh) = src.dimensions();
    let mut out = RgbaImage::new(rect.width, rect.height);

    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = rect.right().min(i64::from(sw));
    let y1 = rect.bottom().min(i64::from(sh));
    if x0 >= x1 || y0 >= y1 {
        return Ok(out);
    }

    let src_stride = sw as usize * 4;
    let dst_stride = rect.width as usize * 4;
    let span = (x1 - x0) as usize * 4;
    let src_raw = src.as_raw();
    let dst_raw: &mut [u8] = &mut out;
    for y in y0..y1 {
        let s = y as usize * src_stride + x0 as usize * 4;
        let d = (y - rect.y) as usize * dst_stride + (x0 - rect.x) as usize * 4;
        dst_raw
            .get_mut(d..d + span)
            .zip(src_raw.get(s..s + span))
            .map(|(d, s)| d.copy_from_slice(s))
            .ok_or_else(|| TesseraError::validation("crop row out of bounds"))?;
    }
    Ok(out)
}

/// Anti-aliased coverage (0..=255 per texel) of a closed path on a `width` x `height` grid.
pub fn polygon_coverage(path: &BezPath, width: u32, height: u32) -> TesseraResult<Vec<u8>> {
    let w: u16 = width.try_into().map_err(|_| {
        TesseraError::validation(format!("fragment width exceeds {MAX_FRAGMENT_EXTENT} px"))
    })?;
    let h: u16 = height.try_into().map_err(|_| {
        TesseraError::validation(format!("fragment height exceeds {MAX_FRAGMENT_EXTENT} px"))
    })?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    ctx.fill_path(&bezpath_to_cpu(path));
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    let data = pixmap.data_as_u8_slice();
    expect_rgba_len(data.len(), width, height, "coverage pixmap")?;
    Ok(data.chunks_exact(4).map(|px| px[3]).collect())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn clip_to_polygon(src: &RgbaImage, geometry: &CropGeometry) -> TesseraResult<RgbaImage> {
    let (w, h) = src.dimensions();
    let coverage = polygon_coverage(&geometry.clip_path(), w, h)?;
    let mut out = RgbaImage::new(w, h);
    for ((d, s), &cov) in out
        .as_mut()
        .chunks_exact_mut(4)
        .zip(src.as_raw().chunks_exact(4))
        .zip(&coverage)
    {
        if cov == 0 {
            continue;
        }
        d[..3].copy_from_slice(&s[..3]);
        d[3] = mul_div255_u8(u16::from(s[3]), u16::from(cov));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/fragment.rs"]
mod tests;
