use std::f64::consts::PI;

const BESSEL_EPSILON: f64 = 1e-12;

/// Modified Bessel function of the first kind, order zero (power series).
pub(crate) fn bessel_i0(x: f64) -> f64 {
    let y = x * x / 4.0;
    let mut sum = 1.0;
    let mut term = y;
    let mut k = 2u32;
    while term > BESSEL_EPSILON * sum {
        sum += term;
        term *= y / f64::from(k * k);
        k += 1;
    }
    sum
}

/// Normalized sinc: `sin(pi x) / (pi x)`.
pub(crate) fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Kaiser window over `x` in `[-1, 1]`; zero outside.
///
/// `inv_i0_beta` is `1 / I0(beta)`, hoisted so per-tap evaluation avoids one series.
pub(crate) fn kaiser_window(x: f64, beta: f64, inv_i0_beta: f64) -> f64 {
    let x2 = x * x;
    if x2 > 1.0 {
        return 0.0;
    }
    bessel_i0(beta * (1.0 - x2).sqrt()) * inv_i0_beta
}

/// Quantize a float parameter so cache keys compare exactly.
pub(crate) fn quantize_milli(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}

pub(crate) fn f32_to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// `x * y / 255`, rounded to nearest.
pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
