//! # pricer_core: Foundation Layer for Swaption-Cube Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace and provides:
//! - Time types: `Date`, `DayCountConvention` (`types::time`)
//! - Error types: `DateError`, `InterpolationError`, `SolverError` (`types::error`)
//! - Root finding and least squares: Brent, Levenberg-Marquardt (`math::solvers`)
//! - Linear interpolation and discrete quadrature (`math::interpolators`, `math::quadrature`)
//! - Yield curves and named curve sets (`market_data::curves`)
//! - Quote tables keyed by (maturity, tenor) offsets (`market_data::quotes`)
//! - Parameter bounds for calibration (`traits::calibration`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: Date arithmetic
//! - thiserror: Error enums
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
//! use pricer_core::types::{Date, DayCountConvention};
//!
//! let reference = Date::from_ymd(2017, 8, 30).unwrap();
//! let expiry = reference.add_months(12).unwrap();
//! let t = DayCountConvention::ActualActual365.year_fraction_dates(reference, expiry);
//!
//! let curve = FlatCurve::new(0.01_f64);
//! let df = curve.discount_factor(t).unwrap();
//! assert!(df < 1.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for Date, DayCountConvention and quote tables

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod traits;
pub mod types;
