//! Swaption lattice, conversion and pricing errors.

use pricer_core::market_data::MarketDataError;
use pricer_core::types::SolverError;
use thiserror::Error;

use crate::analytical::AnalyticalError;
use crate::models::SABRError;
use crate::schedules::ScheduleError;

/// Errors raised by the swaption layer.
///
/// Lattice coordinates are (maturity months, tenor months, moneyness bp).
///
/// # Examples
/// ```
/// use pricer_models::swaptions::SwaptionError;
///
/// let err = SwaptionError::MissingCubeTenor { cube: "EUR".into(), tenor: 120 };
/// assert!(err.to_string().contains("120"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SwaptionError {
    /// Data arrived in a convention the operation does not accept.
    #[error("Invalid convention: expected {expected}, found {found}")]
    InvalidConvention {
        /// Accepted convention(s)
        expected: String,
        /// Convention received
        found: String,
    },

    /// No lattice entry at the requested coordinates.
    #[error("No quote at maturity {maturity}M, tenor {tenor}M, moneyness {moneyness}bp")]
    MissingCoverage {
        /// Maturity in months
        maturity: i32,
        /// Tenor in months
        tenor: i32,
        /// Moneyness in basis points
        moneyness: i32,
    },

    /// Two entries share the same coordinates.
    #[error("Duplicate quote at maturity {maturity}M, tenor {tenor}M, moneyness {moneyness}bp")]
    DuplicateEntry {
        /// Maturity in months
        maturity: i32,
        /// Tenor in months
        tenor: i32,
        /// Moneyness in basis points
        moneyness: i32,
    },

    /// Parallel input arrays disagree in length.
    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Which array
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// A quoted price admits no implied volatility.
    #[error(
        "Implied volatility inversion failed at maturity {maturity}M, tenor {tenor}M, \
         moneyness {moneyness}bp: {reason}"
    )]
    ImpliedVolatilityInversionFailure {
        /// Maturity in months
        maturity: i32,
        /// Tenor in months
        tenor: i32,
        /// Moneyness in basis points
        moneyness: i32,
        /// Underlying failure
        reason: String,
    },

    /// The cube holds no smile for the tenor.
    #[error("Volatility cube {cube} has no tenor {tenor}M")]
    MissingCubeTenor {
        /// Cube name
        cube: String,
        /// Tenor in months
        tenor: i32,
    },

    /// No cube registered under the name.
    #[error("Volatility cube not found: {name}")]
    CubeNotFound {
        /// Requested name
        name: String,
    },

    /// Replication grid needs at least two points.
    #[error("Invalid number of replication evaluation points: {points}")]
    InvalidEvaluationPoints {
        /// Requested point count
        points: usize,
    },

    /// Option expiry is not in the future.
    #[error("Invalid expiry: T = {expiry}")]
    InvalidExpiry {
        /// Time to expiry in years
        expiry: f64,
    },

    /// A tenor smile was built without expiry nodes.
    #[error("Smile for tenor {tenor}M has no expiry nodes")]
    EmptySmile {
        /// Tenor in months
        tenor: i32,
    },

    /// Curve or quote-table failure.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Schedule generation failure.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Option formula failure.
    #[error(transparent)]
    Analytical(#[from] AnalyticalError),

    /// SABR parameter or evaluation failure.
    #[error(transparent)]
    Sabr(#[from] SABRError),

    /// Root-finding failure.
    #[error(transparent)]
    Solver(#[from] SolverError),
}
