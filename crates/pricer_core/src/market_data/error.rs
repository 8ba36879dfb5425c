//! Market data error types.

use crate::types::InterpolationError;
use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::MissingCoverage { table: "rho".into(), maturity: 12, tenor: 60 };
/// assert!(format!("{}", err).contains("(12, 60)"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// No curve registered under the requested name.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// Requested curve name
        name: String,
    },

    /// Invalid maturity (negative time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Query point outside valid domain.
    #[error("Out of bounds: {x} not in [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// A table was used in a convention it is not expressed in.
    #[error("Invalid convention: expected {expected}, found {found}")]
    InvalidConvention {
        /// Convention the operation requires
        expected: String,
        /// Convention actually held
        found: String,
    },

    /// No quote at the requested cell.
    #[error("Missing coverage in table '{table}' at (maturity, tenor) = ({maturity}, {tenor})")]
    MissingCoverage {
        /// Table name
        table: String,
        /// Maturity offset in the table's unit
        maturity: i32,
        /// Tenor offset in the table's unit
        tenor: i32,
    },

    /// The same cell was supplied twice.
    #[error("Duplicate entry in table '{table}' at (maturity, tenor) = ({maturity}, {tenor})")]
    DuplicateEntry {
        /// Table name
        table: String,
        /// Maturity offset in the table's unit
        maturity: i32,
        /// Tenor offset in the table's unit
        tenor: i32,
    },

    /// Parallel inputs disagree in length.
    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Which input was short or long
        what: String,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// A month offset cannot be expressed in whole years.
    #[error("Offset of {months} months is not a whole number of years")]
    IncompatibleOffset {
        /// Offending offset in months
        months: i32,
    },

    /// Interpolation error.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_not_found_display() {
        let err = MarketDataError::CurveNotFound {
            name: "EUR-6M".to_string(),
        };
        assert_eq!(format!("{}", err), "Curve not found: EUR-6M");
    }

    #[test]
    fn test_incompatible_offset_display() {
        let err = MarketDataError::IncompatibleOffset { months: 18 };
        assert!(format!("{}", err).contains("18 months"));
    }

    #[test]
    fn test_from_interpolation_error() {
        let err: MarketDataError = InterpolationError::OutOfBounds {
            x: 5.0,
            min: 0.0,
            max: 3.0,
        }
        .into();
        assert!(matches!(err, MarketDataError::Interpolation(_)));
    }
}
