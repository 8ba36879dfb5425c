//! Root-finding and least-squares solvers.
//!
//! - [`BrentSolver`]: bracketing root finder used for implied volatilities and
//!   for inverting the swap rate of a shifted curve
//! - [`LevenbergMarquardtSolver`]: nonlinear least squares with optional box
//!   constraints, used by SABR calibration
//!
//! Root finders take a [`SolverConfig`]; the least-squares solver takes an
//! [`LMConfig`] with additional damping controls.
//!
//! ```
//! use pricer_core::math::solvers::{BrentSolver, SolverConfig};
//!
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x * x - 2.0, 0.0, 2.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-9);
//! ```

mod brent;
mod config;
mod levenberg_marquardt;

pub use brent::BrentSolver;
pub use config::SolverConfig;
pub use levenberg_marquardt::{LMConfig, LMResult, LevenbergMarquardtSolver};
