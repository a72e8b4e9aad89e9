use crate::compose::fragment::FragmentImage;
use crate::foundation::core::{Point, RgbaImage};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::f32_to_u8;

/// Square, initially transparent atlas canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasCanvas {
    image: RgbaImage,
}

impl AtlasCanvas {
    /// Create a transparent `canvas_size` x `canvas_size` canvas.
    pub fn new(canvas_size: u32) -> TesseraResult<Self> {
        if canvas_size == 0 {
            return Err(TesseraError::validation("canvas_size must be > 0"));
        }
        Ok(Self {
            image: RgbaImage::new(canvas_size, canvas_size),
        })
    }

    /// Canvas side length in pixels.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Current pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Composite `fragment` source-over with its top-left corner at `position` (rounded).
    ///
    /// Parts falling outside the canvas are dropped.
    pub fn place(&mut self, fragment: &FragmentImage, position: Point) {
        self.place_image(&fragment.image, position);
    }

    /// [`AtlasCanvas::place`] for a bare bitmap.
    pub fn place_image(&mut self, src: &RgbaImage, position: Point) {
        let (cw, ch) = self.image.dimensions();
        let ox = position.x.round() as i64;
        let oy = position.y.round() as i64;

        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (ox + i64::from(src.width())).min(i64::from(cw));
        let y1 = (oy + i64::from(src.height())).min(i64::from(ch));
        if x0 >= x1 || y0 >= y1 {
            tracing::debug!(x = ox, y = oy, "fragment lies outside the canvas");
            return;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                let s = src.get_pixel((x - ox) as u32, (y - oy) as u32).0;
                let d = self.image.get_pixel_mut(x as u32, y as u32);
                d.0 = over_straight(d.0, s);
            }
        }
    }

    /// Finished canvas pixels.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Straight-alpha source-over.
pub fn over_straight(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    match (src[3], dst[3]) {
        (0, _) => return dst,
        (255, _) | (_, 0) => return src,
        _ => {}
    }

    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let oa = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (f32::from(src[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / oa;
        out[c] = f32_to_u8(v);
    }
    out[3] = f32_to_u8(oa * 255.0);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compose/atlas.rs"]
mod tests;
