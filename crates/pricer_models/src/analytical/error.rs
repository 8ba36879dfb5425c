//! Error types for analytical pricing operations.

use pricer_core::types::SolverError;
use thiserror::Error;

/// Analytical pricing and inversion errors.
///
/// # Examples
/// ```
/// use pricer_models::analytical::AnalyticalError;
///
/// let err = AnalyticalError::InvalidVolatility { volatility: -0.01 };
/// assert_eq!(format!("{}", err), "Invalid volatility: σ = -0.01");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalyticalError {
    /// Negative or non-finite volatility.
    #[error("Invalid volatility: σ = {volatility}")]
    InvalidVolatility {
        /// The rejected volatility
        volatility: f64,
    },

    /// Non-positive time to expiry where a positive one is required.
    #[error("Invalid expiry: T = {expiry}")]
    InvalidExpiry {
        /// The rejected expiry
        expiry: f64,
    },

    /// Non-positive annuity (numeraire) value.
    #[error("Invalid annuity: {annuity}")]
    InvalidAnnuity {
        /// The rejected annuity
        annuity: f64,
    },

    /// Displaced forward or strike not positive under a lognormal model.
    #[error("Displaced {what} not positive: {value}")]
    NonPositiveDisplaced {
        /// "forward" or "strike"
        what: &'static str,
        /// Displaced value
        value: f64,
    },

    /// No volatility reproduces the target price.
    #[error("Implied volatility not found for price {price}: {reason}")]
    ImpliedVolatility {
        /// Undiscounted target price
        price: f64,
        /// Why inversion failed
        reason: String,
    },

    /// Root finder failure during inversion.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}
