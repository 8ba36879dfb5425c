//! Static dispatch over concrete yield curves.

use super::{FlatCurve, InterpolatedCurve, YieldCurve};
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Concrete yield curve, dispatched by `match`.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{CurveEnum, YieldCurve};
///
/// let curve = CurveEnum::flat(0.01_f64);
/// assert!(curve.discount_factor(1.0).unwrap() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub enum CurveEnum<T: Float> {
    /// Flat rate curve.
    Flat(FlatCurve<T>),
    /// Pillar-interpolated curve.
    Interpolated(InterpolatedCurve<T>),
}

impl<T: Float> CurveEnum<T> {
    /// Shorthand for a flat curve.
    pub fn flat(rate: T) -> Self {
        CurveEnum::Flat(FlatCurve::new(rate))
    }
}

impl<T: Float> YieldCurve<T> for CurveEnum<T> {
    #[inline]
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        match self {
            CurveEnum::Flat(c) => c.discount_factor(t),
            CurveEnum::Interpolated(c) => c.discount_factor(t),
        }
    }

    #[inline]
    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        match self {
            CurveEnum::Flat(c) => c.zero_rate(t),
            CurveEnum::Interpolated(c) => c.zero_rate(t),
        }
    }

    #[inline]
    fn forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        match self {
            CurveEnum::Flat(c) => c.forward_rate(t1, t2),
            CurveEnum::Interpolated(c) => c.forward_rate(t1, t2),
        }
    }
}

impl<T: Float> From<FlatCurve<T>> for CurveEnum<T> {
    fn from(curve: FlatCurve<T>) -> Self {
        CurveEnum::Flat(curve)
    }
}

impl<T: Float> From<InterpolatedCurve<T>> for CurveEnum<T> {
    fn from(curve: InterpolatedCurve<T>) -> Self {
        CurveEnum::Interpolated(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::curves::CurveInterpolation;
    use approx::assert_relative_eq;

    #[test]
    fn test_dispatch_matches_inner_curve() {
        let inner = InterpolatedCurve::new(
            &[1.0_f64, 2.0],
            &[0.01, 0.02],
            CurveInterpolation::Linear,
            true,
        )
        .unwrap();
        let wrapped: CurveEnum<f64> = inner.clone().into();
        for t in [0.5, 1.5, 3.0] {
            assert_relative_eq!(
                wrapped.discount_factor(t).unwrap(),
                inner.discount_factor(t).unwrap()
            );
        }
    }

    #[test]
    fn test_flat_shorthand() {
        let curve = CurveEnum::flat(0.03_f64);
        assert_relative_eq!(curve.zero_rate(4.0).unwrap(), 0.03);
    }
}
