//! Core time and error types.
//!
//! This module provides:
//! - `time`: Time types (Date, DayCountConvention) for schedule and curve calculations
//! - `error`: Structured error types for date, interpolation, and solver operations
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level:
//! - [`Date`], [`DayCountConvention`], [`time_to_maturity_dates`] from `time`
//! - [`DateError`], [`InterpolationError`], [`SolverError`] from `error`

pub mod error;
pub mod time;

pub use error::{DateError, InterpolationError, SolverError};
pub use time::{time_to_maturity_dates, Date, DayCountConvention};
