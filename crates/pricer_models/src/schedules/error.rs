//! Schedule generation error types.

use pricer_core::types::time::Date;
use pricer_core::types::DateError;
use thiserror::Error;

/// Errors that can occur during schedule generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Start date must be before end date.
    #[error("Start date {start} must be before end date {end}")]
    InvalidDateRange {
        /// The start date.
        start: Date,
        /// The end date.
        end: Date,
    },

    /// Missing required field in builder.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Schedule would generate no periods.
    #[error("Schedule would generate no periods between {start} and {end}")]
    NoPeriods {
        /// The start date.
        start: Date,
        /// The end date.
        end: Date,
    },

    /// A schedule needs at least one period.
    #[error("Schedule has no periods")]
    Empty,

    /// Maturity or tenor offset outside the supported range.
    #[error("Invalid offsets: maturity {maturity_months}M, tenor {tenor_months}M")]
    InvalidOffset {
        /// Months from the reference date to the swap start.
        maturity_months: i32,
        /// Swap length in months.
        tenor_months: i32,
    },

    /// Date arithmetic failure.
    #[error(transparent)]
    Date(#[from] DateError),
}
