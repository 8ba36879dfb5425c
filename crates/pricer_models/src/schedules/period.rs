//! Accrual period of a swap leg.

use pricer_core::types::time::{time_to_maturity_dates, Date, DayCountConvention};
use std::fmt;

/// A single accrual period.
///
/// The rate of a period is fixed on its accrual start date (no fixing lag)
/// and paid on its accrual end date.
///
/// # Examples
///
/// ```
/// use pricer_models::schedules::Period;
/// use pricer_core::types::time::{Date, DayCountConvention};
///
/// let period = Period::new(
///     Date::from_ymd(2018, 8, 30).unwrap(),
///     Date::from_ymd(2019, 2, 28).unwrap(),
///     DayCountConvention::ActualActual360,
/// );
///
/// assert_eq!(period.fixing(), period.start());
/// assert!((period.year_fraction() - 182.0 / 360.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    start: Date,
    end: Date,
    day_count: DayCountConvention,
}

impl Period {
    /// Creates a period accruing from `start` to `end`.
    #[inline]
    pub fn new(start: Date, end: Date, day_count: DayCountConvention) -> Self {
        Self {
            start,
            end,
            day_count,
        }
    }

    /// Accrual start date.
    #[inline]
    pub fn start(&self) -> Date {
        self.start
    }

    /// Accrual end date.
    #[inline]
    pub fn end(&self) -> Date {
        self.end
    }

    /// Fixing date of the period rate.
    #[inline]
    pub fn fixing(&self) -> Date {
        self.start
    }

    /// Payment date.
    #[inline]
    pub fn payment(&self) -> Date {
        self.end
    }

    /// Day count convention of the accrual.
    #[inline]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Accrual year fraction under the period's day count.
    #[inline]
    pub fn year_fraction(&self) -> f64 {
        self.day_count.year_fraction_dates(self.start, self.end)
    }

    /// Model time (ACT/365) from `reference` to the payment date.
    #[inline]
    pub fn payment_time(&self, reference: Date) -> f64 {
        time_to_maturity_dates(reference, self.payment())
    }

    /// Calendar days in the period.
    #[inline]
    pub fn days(&self) -> i64 {
        self.end - self.start
    }

    /// True when the period has positive length.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Period({} to {}, {})", self.start, self.end, self.day_count)
    }
}
