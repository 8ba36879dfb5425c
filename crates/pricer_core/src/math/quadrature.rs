//! Discrete quadrature on tabulated integrands.
//!
//! The replication pricer evaluates its integrand once on a fixed grid and
//! integrates the samples, so only array-based rules are provided.

use crate::types::InterpolationError;

/// Quadrature rule applied to tabulated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuadratureRule {
    /// Composite trapezoid rule.
    #[default]
    Trapezoid,
    /// Composite Simpson 1/3 rule, trapezoid on a trailing odd interval.
    Simpson,
}

impl QuadratureRule {
    /// Integrate samples `f` taken at abscissae `x`.
    ///
    /// # Errors
    ///
    /// `InsufficientData` for fewer than two samples or mismatched lengths.
    pub fn integrate(&self, x: &[f64], f: &[f64]) -> Result<f64, InterpolationError> {
        if x.len() < 2 || x.len() != f.len() {
            return Err(InterpolationError::InsufficientData {
                got: x.len().min(f.len()),
                need: 2,
            });
        }
        Ok(match self {
            QuadratureRule::Trapezoid => discrete_trapezoid(x, f),
            QuadratureRule::Simpson => discrete_simpson(x, f),
        })
    }
}

/// `n` equally spaced points from `a` to `b` inclusive.
///
/// ```
/// use pricer_core::math::quadrature::uniform_grid;
///
/// assert_eq!(uniform_grid(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn uniform_grid(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let h = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + i as f64 * h })
                .collect()
        }
    }
}

/// Composite trapezoid rule on (possibly non-uniform) samples.
pub fn discrete_trapezoid(x: &[f64], f: &[f64]) -> f64 {
    x.windows(2)
        .zip(f.windows(2))
        .map(|(xw, fw)| 0.5 * (xw[1] - xw[0]) * (fw[0] + fw[1]))
        .sum()
}

/// Composite Simpson rule on (possibly non-uniform) samples.
///
/// Panels of two intervals use the non-uniform Simpson weights; an odd
/// trailing interval is closed with the trapezoid rule.
pub fn discrete_simpson(x: &[f64], f: &[f64]) -> f64 {
    let n = x.len().min(f.len());
    if n < 3 {
        return discrete_trapezoid(&x[..n], &f[..n]);
    }

    let mut sum = 0.0;
    let mut j = 0;
    while j + 2 < n {
        let h0 = x[j + 1] - x[j];
        let h1 = x[j + 2] - x[j + 1];
        let span = h0 + h1;
        let k = span / (6.0 * h0 * h1);
        sum += k
            * (h1 * (2.0 * h0 - h1) * f[j]
                + span * span * f[j + 1]
                + h0 * (2.0 * h1 - h0) * f[j + 2]);
        j += 2;
    }
    if n % 2 == 0 {
        sum += 0.5 * (x[n - 1] - x[n - 2]) * (f[n - 1] + f[n - 2]);
    }
    sum
}
