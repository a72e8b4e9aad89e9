use crate::foundation::error::{TesseraError, TesseraResult};

pub use image::RgbaImage;
pub use kurbo::{BezPath, Point, Rect};

/// Integer pixel rectangle in source-image space.
///
/// `x`/`y` may be negative when a mask polygon reaches past the image border.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x: i64,
    /// Top edge (inclusive).
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Create a rectangle; zero-sized rectangles are rejected.
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> TesseraResult<Self> {
        if width == 0 || height == 0 {
            return Err(TesseraError::degenerate(format!(
                "pixel rect {width}x{height} has zero area"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Smallest integer rectangle enclosing `rect` (floor of min, ceil of max).
    pub fn enclosing(rect: Rect) -> TesseraResult<Self> {
        let x0 = rect.x0.floor();
        let y0 = rect.y0.floor();
        let x1 = rect.x1.ceil();
        let y1 = rect.y1.ceil();
        let w = x1 - x0;
        let h = y1 - y0;
        if !(w.is_finite() && h.is_finite()) || w > f64::from(u32::MAX) || h > f64::from(u32::MAX)
        {
            return Err(TesseraError::degenerate("bounding box is not representable"));
        }
        Self::new(x0 as i64, y0 as i64, w as u32, h as u32)
    }

    /// Exclusive right edge.
    pub fn right(self) -> i64 {
        self.x + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i64 {
        self.y + i64::from(self.height)
    }

    /// Top-left corner as a floating point position.
    pub fn origin(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Axis-aligned bounding box of a point list, or `None` for an empty list.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut r = Rect::from_points(*first, *first);
    for &p in &points[1..] {
        r = r.union_pt(p);
    }
    Some(r)
}

/// Closed polygon path through `points` (no-op path for fewer than two points).
pub fn polygon_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut it = points.iter();
    if let Some(&first) = it.next() {
        path.move_to(first);
        for &p in it {
            path.line_to(p);
        }
        path.close_path();
    }
    path
}

/// Validate raw RGBA8 buffer length against its dimensions.
pub(crate) fn expect_rgba_len(len: usize, width: u32, height: u32, what: &str) -> TesseraResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TesseraError::validation(format!("{what}: buffer size overflow")))?;
    if len != expected {
        return Err(TesseraError::validation(format!(
            "{what}: expected {expected} bytes for {width}x{height}, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
