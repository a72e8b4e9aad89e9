use rayon::prelude::*;

use crate::foundation::core::RgbaImage;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::{bessel_i0, f32_to_u8, kaiser_window, sinc};

/// Normalized taps for one output coordinate along one axis.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisTaps {
    /// Source indices, already edge-clamped; may repeat near the borders.
    pub indices: Vec<usize>,
    /// Weights summing to 1 (or all zero when the raw window sum vanished).
    pub weights: Vec<f32>,
}

impl AxisTaps {
    /// Sum of the normalized weights.
    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// Separable Kaiser-windowed sinc resampler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KaiserFilter {
    beta: f64,
    radius: u32,
    inv_i0_beta: f64,
}

impl KaiserFilter {
    /// Create a filter; `beta` must be finite and >= 0, `radius` >= 1.
    pub fn new(beta: f64, radius: u32) -> TesseraResult<Self> {
        if !beta.is_finite() || beta < 0.0 {
            return Err(TesseraError::invalid_filter(format!(
                "kaiser beta must be finite and >= 0, got {beta}"
            )));
        }
        if radius < 1 {
            return Err(TesseraError::invalid_filter("kaiser radius must be >= 1"));
        }
        Ok(Self {
            beta,
            radius,
            inv_i0_beta: 1.0 / bessel_i0(beta),
        })
    }

    /// Window shape parameter.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Support radius in source texels.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Raw (unnormalized) kernel value at signed distance `d` source texels.
    pub fn kernel(&self, d: f64) -> f64 {
        sinc(d) * kaiser_window(d / f64::from(self.radius), self.beta, self.inv_i0_beta)
    }

    /// Precompute taps for mapping `src_len` samples onto `dst_len` samples.
    pub fn axis_taps(&self, src_len: u32, dst_len: u32) -> Vec<AxisTaps> {
        let scale = f64::from(src_len) / f64::from(dst_len);
        let r = i64::from(self.radius);
        let last = i64::from(src_len) - 1;

        (0..dst_len)
            .map(|out| {
                let center = (f64::from(out) + 0.5) * scale - 0.5;
                let base = center.round() as i64;

                let mut indices = Vec::with_capacity((2 * r + 1) as usize);
                let mut raw = Vec::with_capacity((2 * r + 1) as usize);
                let mut sum = 0.0f64;
                for j in (base - r)..=(base + r) {
                    let w = self.kernel(j as f64 - center);
                    indices.push(j.clamp(0, last) as usize);
                    raw.push(w);
                    sum += w;
                }

                let weights = if sum.abs() > f64::EPSILON {
                    raw.iter().map(|w| (w / sum) as f32).collect()
                } else {
                    vec![0.0; raw.len()]
                };
                AxisTaps { indices, weights }
            })
            .collect()
    }

    /// Two-pass resample: horizontal into a float buffer, then vertical into RGBA8.
    pub fn resample(&self, src: &RgbaImage, dst_w: u32, dst_h: u32) -> TesseraResult<RgbaImage> {
        let (src_w, src_h) = src.dimensions();
        if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
            return Err(TesseraError::validation(
                "kaiser resample expects non-empty source and target",
            ));
        }

        let x_taps = self.axis_taps(src_w, dst_w);
        let y_taps = self.axis_taps(src_h, dst_h);

        let mut tmp = vec![0.0f32; (dst_w as usize) * (src_h as usize) * 4];
        horizontal_pass(src.as_raw(), src_w, dst_w, &x_taps, &mut tmp);

        let mut out = vec![0u8; (dst_w as usize) * (dst_h as usize) * 4];
        vertical_pass(&tmp, dst_w, &y_taps, &mut out);

        RgbaImage::from_raw(dst_w, dst_h, out)
            .ok_or_else(|| TesseraError::validation("kaiser output buffer size mismatch"))
    }
}

fn horizontal_pass(src: &[u8], src_w: u32, dst_w: u32, taps: &[AxisTaps], dst: &mut [f32]) {
    let src_stride = src_w as usize * 4;
    let dst_stride = dst_w as usize * 4;
    dst.par_chunks_mut(dst_stride)
        .zip(src.par_chunks(src_stride))
        .for_each(|(dst_row, src_row)| {
            for (px, t) in dst_row.chunks_exact_mut(4).zip(taps) {
                let mut acc = [0.0f32; 4];
                for (&i, &w) in t.indices.iter().zip(&t.weights) {
                    let s = &src_row[i * 4..i * 4 + 4];
                    for c in 0..4 {
                        acc[c] += w * f32::from(s[c]);
                    }
                }
                px.copy_from_slice(&acc);
            }
        });
}

fn vertical_pass(src: &[f32], width: u32, taps: &[AxisTaps], dst: &mut [u8]) {
    let stride = width as usize * 4;
    dst.par_chunks_mut(stride)
        .zip(taps.par_iter())
        .for_each(|(dst_row, t)| {
            for x in 0..width as usize {
                let mut acc = [0.0f32; 4];
                for (&i, &w) in t.indices.iter().zip(&t.weights) {
                    let s = &src[i * stride + x * 4..i * stride + x * 4 + 4];
                    for c in 0..4 {
                        acc[c] += w * s[c];
                    }
                }
                for c in 0..4 {
                    dst_row[x * 4 + c] = f32_to_u8(acc[c]);
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/resample/kaiser.rs"]
mod tests;
