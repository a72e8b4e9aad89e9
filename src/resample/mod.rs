//! Interchangeable pixel resampling filters over straight RGBA8 buffers.
//!
//! All filters share one contract: `resample(crop, w, h, filter)` returns a `w`x`h` image
//! (each axis clamped to at least 1) and returns the crop unchanged when sizes already match.

/// Custom separable Kaiser-windowed sinc filter.
pub mod kaiser;

use image::imageops::{self, FilterType};

use crate::foundation::core::RgbaImage;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::quantize_milli;

/// Default Kaiser window shape.
pub const DEFAULT_KAISER_BETA: f64 = 4.0;
/// Default Kaiser support radius in source texels.
pub const DEFAULT_KAISER_RADIUS: u32 = 3;
/// Largest accepted Kaiser radius; bounds per-texel work to `2 * 64 + 1` taps per axis.
pub const MAX_KAISER_RADIUS: u32 = 64;

/// Filter family, without parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Nearest texel, hard edges.
    Nearest,
    /// Lanczos (a = 3) windowed sinc.
    Lanczos,
    /// Kaiser-windowed sinc with tunable `beta` and `radius`.
    Kaiser,
}

/// Fully parameterized resampling filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Nearest texel.
    Nearest,
    /// Lanczos3, the general-purpose default.
    #[default]
    Lanczos,
    /// Kaiser-windowed sinc.
    Kaiser {
        /// Window shape: higher trades passband ripple for stopband attenuation.
        beta: f64,
        /// Support in source texels; `2 * radius + 1` taps per axis.
        radius: u32,
    },
}

impl ResampleFilter {
    /// Build a filter from a mode plus optional Kaiser parameters.
    ///
    /// Missing Kaiser parameters fall back to [`DEFAULT_KAISER_BETA`] / [`DEFAULT_KAISER_RADIUS`];
    /// parameters passed to other modes are ignored.
    pub fn from_mode(
        mode: FilterMode,
        beta: Option<f64>,
        radius: Option<i64>,
    ) -> TesseraResult<Self> {
        let filter = match mode {
            FilterMode::Nearest => Self::Nearest,
            FilterMode::Lanczos => Self::Lanczos,
            FilterMode::Kaiser => {
                let radius = radius.unwrap_or(i64::from(DEFAULT_KAISER_RADIUS));
                if !(1..=i64::from(MAX_KAISER_RADIUS)).contains(&radius) {
                    return Err(TesseraError::invalid_filter(format!(
                        "kaiser radius must be in 1..={MAX_KAISER_RADIUS}, got {radius}"
                    )));
                }
                Self::Kaiser {
                    beta: beta.unwrap_or(DEFAULT_KAISER_BETA),
                    radius: radius as u32,
                }
            }
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Parameterless family of this filter.
    pub fn mode(&self) -> FilterMode {
        match self {
            Self::Nearest => FilterMode::Nearest,
            Self::Lanczos => FilterMode::Lanczos,
            Self::Kaiser { .. } => FilterMode::Kaiser,
        }
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> TesseraResult<()> {
        if let Self::Kaiser { beta, radius } = *self {
            if !beta.is_finite() || beta < 0.0 {
                return Err(TesseraError::invalid_filter(format!(
                    "kaiser beta must be finite and >= 0, got {beta}"
                )));
            }
            if !(1..=MAX_KAISER_RADIUS).contains(&radius) {
                return Err(TesseraError::invalid_filter(format!(
                    "kaiser radius must be in 1..={MAX_KAISER_RADIUS}, got {radius}"
                )));
            }
        }
        Ok(())
    }

    /// Hashable identity with parameters rounded to 1e-3.
    pub fn key(&self) -> FilterKey {
        match *self {
            Self::Nearest => FilterKey {
                mode: FilterMode::Nearest,
                beta_milli: 0,
                radius: 0,
            },
            Self::Lanczos => FilterKey {
                mode: FilterMode::Lanczos,
                beta_milli: 0,
                radius: 0,
            },
            Self::Kaiser { beta, radius } => FilterKey {
                mode: FilterMode::Kaiser,
                beta_milli: quantize_milli(beta),
                radius,
            },
        }
    }
}

/// Cache-key form of a [`ResampleFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterKey {
    /// Filter family.
    pub mode: FilterMode,
    /// `beta * 1000`, rounded.
    pub beta_milli: i64,
    /// Kaiser radius (0 for other modes).
    pub radius: u32,
}

/// Resample `src` to `target_width` x `target_height` (each clamped to >= 1) with `filter`.
pub fn resample(
    src: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: &ResampleFilter,
) -> TesseraResult<RgbaImage> {
    filter.validate()?;
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return Err(TesseraError::validation("cannot resample an empty image"));
    }
    let tw = target_width.max(1);
    let th = target_height.max(1);
    if (sw, sh) == (tw, th) {
        return Ok(src.clone());
    }

    let out = match *filter {
        ResampleFilter::Nearest => imageops::resize(src, tw, th, FilterType::Nearest),
        ResampleFilter::Lanczos => imageops::resize(src, tw, th, FilterType::Lanczos3),
        ResampleFilter::Kaiser { beta, radius } => {
            kaiser::KaiserFilter::new(beta, radius)?.resample(src, tw, th)?
        }
    };
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/resample/mod.rs"]
mod tests;
