//! Yield curves.
//!
//! - [`YieldCurve`]: Generic trait for discount factor and rate calculations
//! - [`FlatCurve`]: Constant continuously-compounded rate
//! - [`InterpolatedCurve`]: Pillar-based interpolated curve
//! - [`CurveEnum`]: Static dispatch over the concrete curves
//! - [`CurveSet`]: Curves registered under string names

mod curve_enum;
mod curve_set;
mod flat;
mod interpolated;
mod traits;

pub use curve_enum::CurveEnum;
pub use curve_set::CurveSet;
pub use flat::FlatCurve;
pub use interpolated::{CurveInterpolation, InterpolatedCurve};
pub use traits::YieldCurve;
