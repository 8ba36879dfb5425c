//! Interpolated yield curve implementation.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;
use crate::math::interpolators::{Interpolator, LinearInterpolator};
use num_traits::Float;

/// What is interpolated between pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveInterpolation {
    /// Linear in zero rates.
    Linear,
    /// Linear in log discount factors (piecewise flat forwards).
    #[default]
    LogLinear,
}

/// Yield curve through (time, zero rate) pillars.
///
/// Beyond the pillars the curve either fails with `OutOfBounds` or, when
/// extrapolation is allowed, holds the boundary zero rate flat.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, YieldCurve};
///
/// let curve = InterpolatedCurve::new(
///     &[1.0_f64, 5.0, 10.0],
///     &[0.010, 0.015, 0.020],
///     CurveInterpolation::Linear,
///     true,
/// )
/// .unwrap();
/// assert!((curve.zero_rate(3.0).unwrap() - 0.0125).abs() < 1e-12);
/// assert!((curve.zero_rate(30.0).unwrap() - 0.020).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedCurve<T: Float> {
    rates: LinearInterpolator<T>,
    log_discounts: LinearInterpolator<T>,
    method: CurveInterpolation,
    allow_extrapolation: bool,
}

impl<T: Float> InterpolatedCurve<T> {
    /// Construct from pillar times and zero rates.
    ///
    /// Pillar times must be positive and strictly increasing.
    pub fn new(
        times: &[T],
        rates: &[T],
        method: CurveInterpolation,
        allow_extrapolation: bool,
    ) -> Result<Self, MarketDataError> {
        if times.len() != rates.len() {
            return Err(MarketDataError::LengthMismatch {
                what: "curve rates".to_string(),
                expected: times.len(),
                got: rates.len(),
            });
        }
        if let Some(&bad) = times.iter().find(|&&t| t <= T::zero()) {
            return Err(MarketDataError::InvalidMaturity {
                t: bad.to_f64().unwrap_or(0.0),
            });
        }

        let log_dfs: Vec<T> = times.iter().zip(rates).map(|(&t, &r)| -r * t).collect();

        Ok(Self {
            rates: LinearInterpolator::new(times, rates)?,
            log_discounts: LinearInterpolator::new(times, &log_dfs)?,
            method,
            allow_extrapolation,
        })
    }

    /// First and last pillar.
    #[inline]
    pub fn domain(&self) -> (T, T) {
        self.rates.domain()
    }

    /// Interpolation method.
    #[inline]
    pub fn method(&self) -> CurveInterpolation {
        self.method
    }

    /// Whether flat extrapolation is enabled.
    #[inline]
    pub fn allow_extrapolation(&self) -> bool {
        self.allow_extrapolation
    }

    fn rate_at(&self, t: T) -> Result<T, MarketDataError> {
        let (t_min, t_max) = self.domain();
        if t < t_min || t > t_max {
            if !self.allow_extrapolation {
                return Err(MarketDataError::OutOfBounds {
                    x: t.to_f64().unwrap_or(0.0),
                    min: t_min.to_f64().unwrap_or(0.0),
                    max: t_max.to_f64().unwrap_or(0.0),
                });
            }
            return Ok(self.rates.interpolate_flat(t));
        }

        match self.method {
            CurveInterpolation::Linear => Ok(self.rates.interpolate(t)?),
            CurveInterpolation::LogLinear => Ok(-self.log_discounts.interpolate(t)? / t),
        }
    }
}

impl<T: Float> YieldCurve<T> for InterpolatedCurve<T> {
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        if t == T::zero() {
            return Ok(T::one());
        }
        Ok((-self.rate_at(t)? * t).exp())
    }

    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t <= T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        self.rate_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pillars() -> ([f64; 3], [f64; 3]) {
        ([0.5, 1.0, 2.0], [0.02, 0.04, 0.04])
    }

    #[test]
    fn test_new_rejects_bad_pillars() {
        assert!(matches!(
            InterpolatedCurve::new(&[1.0_f64], &[0.02], CurveInterpolation::Linear, false),
            Err(MarketDataError::Interpolation(_))
        ));
        assert!(matches!(
            InterpolatedCurve::new(
                &[-0.5_f64, 1.0],
                &[0.02, 0.02],
                CurveInterpolation::Linear,
                false
            ),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
        assert!(matches!(
            InterpolatedCurve::new(&[0.5_f64, 1.0], &[0.02], CurveInterpolation::Linear, false),
            Err(MarketDataError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_linear_zero_rate_midpoint() {
        let (t, r) = pillars();
        let curve = InterpolatedCurve::new(&t, &r, CurveInterpolation::Linear, false).unwrap();
        assert_relative_eq!(curve.zero_rate(0.75).unwrap(), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_log_linear_reproduces_pillars() {
        let (t, r) = pillars();
        let curve = InterpolatedCurve::new(&t, &r, CurveInterpolation::LogLinear, false).unwrap();
        for (ti, ri) in t.iter().zip(&r) {
            assert_relative_eq!(
                curve.discount_factor(*ti).unwrap(),
                (-ri * ti).exp(),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_log_linear_has_flat_forwards_between_pillars() {
        let (t, r) = pillars();
        let curve = InterpolatedCurve::new(&t, &r, CurveInterpolation::LogLinear, false).unwrap();
        let f1 = curve.forward_rate(1.1, 1.2).unwrap();
        let f2 = curve.forward_rate(1.7, 1.9).unwrap();
        assert_relative_eq!(f1, f2, epsilon = 1e-10);
    }

    #[test]
    fn test_extrapolation_switch() {
        let (t, r) = pillars();
        let strict = InterpolatedCurve::new(&t, &r, CurveInterpolation::Linear, false).unwrap();
        assert!(matches!(
            strict.discount_factor(3.0),
            Err(MarketDataError::OutOfBounds { .. })
        ));

        let flat = InterpolatedCurve::new(&t, &r, CurveInterpolation::Linear, true).unwrap();
        assert_relative_eq!(flat.zero_rate(0.1).unwrap(), 0.02);
        assert_relative_eq!(flat.zero_rate(30.0).unwrap(), 0.04);
        assert_eq!(flat.discount_factor(0.0).unwrap(), 1.0);
    }
}
