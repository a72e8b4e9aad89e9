use crate::foundation::core::{BezPath, PixelRect, Point, bounding_rect, polygon_path};
use crate::foundation::error::{TesseraError, TesseraResult};

/// Result of mapping a source-space mask polygon into fragment (target) space.
#[derive(Clone, Debug, PartialEq)]
pub struct CropGeometry {
    /// Enclosing integer bounding rectangle of the polygon, in source pixels.
    pub source_rect: PixelRect,
    /// Polygon relative to `source_rect`'s origin, scaled by `scale_factor`.
    pub clip_polygon: Vec<Point>,
    /// Target pixels per source pixel.
    pub scale_factor: f64,
}

impl CropGeometry {
    /// Fragment pixel size: `round(rect * scale_factor)`, each axis at least 1.
    pub fn target_size(&self) -> (u32, u32) {
        (
            scaled_extent(self.source_rect.width, self.scale_factor),
            scaled_extent(self.source_rect.height, self.scale_factor),
        )
    }

    /// Clip polygon as a closed path.
    pub fn clip_path(&self) -> BezPath {
        polygon_path(&self.clip_polygon)
    }
}

/// Map `points` (source pixel space) into a cropped target space.
///
/// Fails with [`TesseraError::DegenerateGeometry`] for fewer than 3 points, non-finite
/// coordinates, a zero-width or zero-height bounding box, or a non-positive scale.
pub fn transform_polygon(points: &[Point], scale_factor: f64) -> TesseraResult<CropGeometry> {
    if points.len() < 3 {
        return Err(TesseraError::degenerate(format!(
            "polygon needs at least 3 points, got {}",
            points.len()
        )));
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(TesseraError::degenerate("polygon has non-finite coordinates"));
    }
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return Err(TesseraError::degenerate(format!(
            "scale factor must be finite and > 0, got {scale_factor}"
        )));
    }

    let bbox = bounding_rect(points)
        .ok_or_else(|| TesseraError::degenerate("polygon has no points"))?;
    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return Err(TesseraError::degenerate(format!(
            "polygon bounding box {}x{} has zero area",
            bbox.width(),
            bbox.height()
        )));
    }

    let source_rect = PixelRect::enclosing(bbox)?;
    let origin = source_rect.origin();
    let clip_polygon = points
        .iter()
        .map(|p| {
            Point::new(
                (p.x - origin.x) * scale_factor,
                (p.y - origin.y) * scale_factor,
            )
        })
        .collect();

    Ok(CropGeometry {
        source_rect,
        clip_polygon,
        scale_factor,
    })
}

pub(crate) fn scaled_extent(extent: u32, scale_factor: f64) -> u32 {
    let v = (f64::from(extent) * scale_factor).round();
    if v.is_finite() {
        v.clamp(1.0, f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
