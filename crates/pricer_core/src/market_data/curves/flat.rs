//! Flat yield curve implementation.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Yield curve with a single continuously-compounded rate.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::new(0.01_f64);
/// assert!((curve.discount_factor(2.0).unwrap() - (-0.02_f64).exp()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCurve<T: Float> {
    rate: T,
}

impl<T: Float> FlatCurve<T> {
    /// Create a flat curve; negative rates are allowed.
    #[inline]
    pub fn new(rate: T) -> Self {
        Self { rate }
    }

    /// The flat rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.rate
    }
}

impl<T: Float> YieldCurve<T> for FlatCurve<T> {
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok((-self.rate * t).exp())
    }

    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t <= T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok(self.rate)
    }

    fn forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        if t2 <= t1 {
            return Err(MarketDataError::InvalidMaturity {
                t: (t2 - t1).to_f64().unwrap_or(0.0),
            });
        }
        Ok(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_discount_factor_at_zero_is_one() {
        assert_eq!(FlatCurve::new(0.05_f64).discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_negative_rate_grows() {
        let curve = FlatCurve::new(-0.005_f64);
        assert!(curve.discount_factor(10.0).unwrap() > 1.0);
    }

    #[test]
    fn test_negative_time_rejected() {
        let curve = FlatCurve::new(0.01_f64);
        assert_eq!(
            curve.discount_factor(-0.5),
            Err(MarketDataError::InvalidMaturity { t: -0.5 })
        );
    }

    #[test]
    fn test_rates_are_flat() {
        let curve = FlatCurve::new(0.015_f64);
        assert_relative_eq!(curve.zero_rate(7.0).unwrap(), 0.015);
        assert_relative_eq!(curve.forward_rate(0.5, 9.0).unwrap(), 0.015);
    }
}
