//! Standard normal distribution functions.
//!
//! `norm_cdf` goes through `statrs`' complementary error function, which is
//! accurate to machine precision in both tails. Implied-volatility inversion
//! and the replication boundary terms depend on that accuracy.

use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal cumulative distribution function Φ(x).
///
/// # Example
///
/// ```
/// use pricer_models::analytical::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-16);
/// assert!((norm_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-14);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal probability density function φ(x).
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}
