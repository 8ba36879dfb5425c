//! # pricer_optimiser
//!
//! Calibration of SABR swaption cubes.
//!
//! This crate sits above Models (L2) in the architecture, solving the
//! inverse problem from market quotes to a [`SabrVolatilityCube`].
//!
//! ## Architecture Position
//!
//! Layer 2.5 in the **P**ricer layer.
//! Depends on `pricer_core` (L1) and `pricer_models` (L2).
//!
//! ## Modules
//!
//! - `calibration`: SABR cube calibration to cash-settled and physical swaptions
//!
//! ## Example
//!
//! ```rust,ignore
//! use pricer_optimiser::calibration::SabrCubeCalibrator;
//!
//! let cube = SabrCubeCalibrator::new(date, payers, receivers, atm, market, mapping, structure)
//!     .set_calibration_parameters(100, 4)
//!     .calibrate("EUR", &[12, 60, 120])?;
//! ```
//!
//! [`SabrVolatilityCube`]: pricer_models::swaptions::SabrVolatilityCube

pub mod calibration;

mod error;

pub use error::OptimiserError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::calibration::*;
    pub use crate::OptimiserError;
}
