//! Market data: yield curves and quote tables.
//!
//! - [`curves`]: Yield curve trait, flat and pillar-interpolated curves, named curve sets
//! - [`quotes`]: Quote tables keyed by (maturity, tenor) offsets
//! - [`error`]: Market data error types (MarketDataError)
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
//!
//! let curve = FlatCurve::new(0.05_f64);
//! let df = curve.discount_factor(1.0).unwrap();
//! assert!((df - 0.951229).abs() < 1e-5);
//! ```

pub mod curves;
pub mod error;
pub mod quotes;

pub use curves::{CurveEnum, CurveInterpolation, CurveSet, FlatCurve, InterpolatedCurve, YieldCurve};
pub use error::MarketDataError;
pub use quotes::{QuoteTable, TableConvention};
