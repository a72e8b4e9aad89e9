use crate::foundation::core::RgbaImage;
use crate::foundation::math::f32_to_u8;

/// One pyramid level: per-texel color plus coverage.
#[derive(Clone, Debug)]
struct Level {
    width: u32,
    height: u32,
    color: Vec<[f32; 3]>,
    covered: Vec<bool>,
}

impl Level {
    fn from_image(img: &RgbaImage, alpha_threshold: u8) -> Self {
        let (width, height) = img.dimensions();
        let mut color = Vec::with_capacity((width as usize) * (height as usize));
        let mut covered = Vec::with_capacity(color.capacity());
        for px in img.as_raw().chunks_exact(4) {
            color.push([f32::from(px[0]), f32::from(px[1]), f32::from(px[2])]);
            covered.push(px[3] > alpha_threshold);
        }
        Self {
            width,
            height,
            color,
            covered,
        }
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Next coarser level. Odd edges replicate their last row/column.
    fn halve(&self) -> Self {
        let width = self.width.div_ceil(2);
        let height = self.height.div_ceil(2);
        let mut color = vec![[0.0f32; 3]; (width as usize) * (height as usize)];
        let mut covered = vec![false; color.len()];

        for y in 0..height {
            for x in 0..width {
                let mut sum = [0.0f32; 3];
                let mut n = 0u32;
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let sx = (2 * x + dx).min(self.width - 1);
                    let sy = (2 * y + dy).min(self.height - 1);
                    let i = self.idx(sx, sy);
                    if self.covered[i] {
                        let c = self.color[i];
                        sum[0] += c[0];
                        sum[1] += c[1];
                        sum[2] += c[2];
                        n += 1;
                    }
                }
                if n > 0 {
                    let o = (y as usize) * (width as usize) + (x as usize);
                    let inv = 1.0 / n as f32;
                    color[o] = [sum[0] * inv, sum[1] * inv, sum[2] * inv];
                    covered[o] = true;
                }
            }
        }

        Self {
            width,
            height,
            color,
            covered,
        }
    }

    /// Fill uncovered texels from the (already flooded) coarser level.
    fn fill_from(&mut self, coarser: &Level) {
        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.idx(x, y);
                if !self.covered[i] {
                    self.color[i] = coarser.color[coarser.idx(x / 2, y / 2)];
                }
            }
        }
    }
}

/// Halvings needed to reach 1x1 from a `width` x `height` image.
pub fn auto_levels(width: u32, height: u32) -> u32 {
    let mut side = width.max(height);
    let mut n = 0;
    while side > 1 {
        side = side.div_ceil(2);
        n += 1;
    }
    n
}

/// Return a copy of `img` whose uncovered texels carry color flooded from covered ones.
///
/// A texel is covered when its alpha exceeds `alpha_threshold`. `levels <= 0` builds the full
/// pyramid; larger values cap the number of halvings. Alpha is never modified.
#[tracing::instrument(skip(img), fields(w = img.width(), h = img.height()))]
pub fn flood(img: &RgbaImage, alpha_threshold: u8, levels: i32) -> RgbaImage {
    let mut out = img.clone();
    flood_in_place(&mut out, alpha_threshold, levels);
    out
}

/// In-place form of [`flood`].
pub fn flood_in_place(img: &mut RgbaImage, alpha_threshold: u8, levels: i32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    let max_levels = auto_levels(w, h);
    let halvings = if levels <= 0 {
        max_levels
    } else {
        (levels as u32).min(max_levels)
    };

    let mut pyramid = vec![Level::from_image(img, alpha_threshold)];
    for _ in 0..halvings {
        let next = pyramid[pyramid.len() - 1].halve();
        pyramid.push(next);
    }

    for i in (0..pyramid.len().saturating_sub(1)).rev() {
        let (finer, coarser) = pyramid.split_at_mut(i + 1);
        finer[i].fill_from(&coarser[0]);
    }

    let base = &pyramid[0];
    let mut flooded = 0usize;
    for ((px, c), &covered) in img
        .as_mut()
        .chunks_exact_mut(4)
        .zip(&base.color)
        .zip(&base.covered)
    {
        if covered {
            continue;
        }
        px[0] = f32_to_u8(c[0]);
        px[1] = f32_to_u8(c[1]);
        px[2] = f32_to_u8(c[2]);
        flooded += 1;
    }
    tracing::debug!(halvings, flooded, "mip flood");
}

#[cfg(test)]
#[path = "../../tests/unit/flood/mip.rs"]
mod tests;
