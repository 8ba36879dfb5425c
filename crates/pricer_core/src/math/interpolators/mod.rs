//! Interpolation methods.
//!
//! One-dimensional interpolators implement [`Interpolator`]. The only scheme
//! needed here is piecewise linear: yield curves interpolate zero rates or log
//! discount factors between pillars, and SABR smiles interpolate parameters
//! between expiry nodes with flat extrapolation.
//!
//! ```
//! use pricer_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let interp: LinearInterpolator<f64> = LinearInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
//! assert_eq!(interp.domain(), (0.0, 2.0));
//! assert!((interp.interpolate(1.5).unwrap() - 2.5).abs() < 1e-12);
//! assert_eq!(interp.interpolate_flat(5.0), 4.0);
//! ```

mod linear;

pub use linear::LinearInterpolator;

use crate::types::InterpolationError;
use num_traits::Float;

/// One-dimensional interpolation over a closed domain.
pub trait Interpolator<T: Float> {
    /// Interpolated value at `x`, failing outside [`domain`](Interpolator::domain).
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Smallest and largest abscissa.
    fn domain(&self) -> (T, T);
}
