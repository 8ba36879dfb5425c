//! Linear interpolation implementation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Piecewise linear interpolator over strictly increasing abscissae.
///
/// # Example
///
/// ```
/// use pricer_core::math::interpolators::{Interpolator, LinearInterpolator};
///
/// let interp: LinearInterpolator<f64> = LinearInterpolator::new(&[1.0, 2.0, 5.0], &[0.2, 0.4, 0.1]).unwrap();
/// assert!((interp.interpolate(1.5).unwrap() - 0.3).abs() < 1e-12);
/// assert!(interp.interpolate(6.0).is_err());
/// assert_eq!(interp.interpolate_flat(0.0), 0.2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
}

impl<T: Float> LinearInterpolator<T> {
    /// Construct from x and y data points.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` for fewer than 2 points or mismatched lengths
    /// - `NonMonotonicData` if `xs` is not strictly increasing
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return Err(InterpolationError::InsufficientData {
                got: xs.len().min(ys.len()),
                need: 2,
            });
        }
        if let Some(index) = xs.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(InterpolationError::NonMonotonicData { index: index + 1 });
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Abscissae.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Ordinates.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Number of data points.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed interpolator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Interpolate with flat extrapolation beyond either end.
    pub fn interpolate_flat(&self, x: T) -> T {
        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            self.ys[0]
        } else if x >= self.xs[last] {
            self.ys[last]
        } else {
            self.segment_value(x)
        }
    }

    /// Returns `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: T) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        pos.clamp(1, self.xs.len() - 1) - 1
    }

    #[inline]
    fn segment_value(&self, x: T) -> T {
        let i = self.find_segment(x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

impl<T: Float> Interpolator<T> for LinearInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();
        if x < x_min || x > x_max || x.is_nan() {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(self.segment_value(x))
    }

    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_short_or_mismatched_input() {
        assert!(matches!(
            LinearInterpolator::new(&[0.0], &[1.0]),
            Err(InterpolationError::InsufficientData { got: 1, need: 2 })
        ));
        assert!(LinearInterpolator::new(&[0.0, 1.0], &[1.0]).is_err());
    }

    #[test]
    fn test_rejects_unsorted_input() {
        assert_eq!(
            LinearInterpolator::new(&[0.0, 2.0, 1.0], &[0.0, 0.0, 0.0]),
            Err(InterpolationError::NonMonotonicData { index: 2 })
        );
        assert!(LinearInterpolator::new(&[0.0, 0.0], &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_knots_are_reproduced() {
        let xs = [0.5, 1.0, 2.0, 10.0];
        let ys = [0.01, 0.012, 0.015, 0.02];
        let interp = LinearInterpolator::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(interp.interpolate(*x).unwrap(), *y, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let interp = LinearInterpolator::new(&[1.0, 2.0], &[1.0, 2.0]).unwrap();
        let err = interp.interpolate(2.5).unwrap_err();
        assert_eq!(
            err,
            InterpolationError::OutOfBounds {
                x: 2.5,
                min: 1.0,
                max: 2.0
            }
        );
    }

    #[test]
    fn test_flat_extrapolation() {
        let interp = LinearInterpolator::new(&[1.0, 2.0], &[3.0, 5.0]).unwrap();
        assert_eq!(interp.interpolate_flat(-10.0), 3.0);
        assert_eq!(interp.interpolate_flat(10.0), 5.0);
        assert_relative_eq!(interp.interpolate_flat(1.25), 3.5);
    }

    proptest! {
        #[test]
        fn prop_stays_within_neighbouring_values(x in 0.0f64..4.0) {
            let ys = [1.0, -2.0, 0.5, 3.0, 3.0];
            let interp = LinearInterpolator::new(&[0.0, 1.0, 2.0, 3.0, 4.0], &ys).unwrap();
            let y = interp.interpolate(x).unwrap();
            let i = (x.floor() as usize).min(3);
            let lo = ys[i].min(ys[i + 1]);
            let hi = ys[i].max(ys[i + 1]);
            prop_assert!(y >= lo - 1e-12 && y <= hi + 1e-12);
        }
    }
}
