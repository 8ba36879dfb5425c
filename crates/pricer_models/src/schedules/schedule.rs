//! Schedule, ScheduleBuilder and SchedulePrototype.

use super::error::ScheduleError;
use super::frequency::Frequency;
use super::period::Period;
use pricer_core::types::time::{time_to_maturity_dates, Date, DayCountConvention};

/// Ordered, non-empty sequence of accrual periods.
///
/// # Examples
///
/// ```
/// use pricer_models::schedules::{Frequency, ScheduleBuilder};
/// use pricer_core::types::time::{Date, DayCountConvention};
///
/// let schedule = ScheduleBuilder::new()
///     .start(Date::from_ymd(2018, 8, 30).unwrap())
///     .end(Date::from_ymd(2023, 8, 30).unwrap())
///     .frequency(Frequency::Annual)
///     .day_count(DayCountConvention::Thirty360)
///     .build()
///     .unwrap();
///
/// assert_eq!(schedule.len(), 5);
/// assert!((schedule.average_period_length() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    periods: Vec<Period>,
}

impl Schedule {
    /// Creates a schedule from contiguous periods.
    ///
    /// Fails with `Empty` on an empty list and `InvalidDateRange` when a
    /// period is empty or does not start where the previous one ended.
    pub fn new(periods: Vec<Period>) -> Result<Self, ScheduleError> {
        let (first, last) = match (periods.first(), periods.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ScheduleError::Empty),
        };
        for (i, period) in periods.iter().enumerate() {
            let contiguous = i == 0 || periods[i - 1].end() == period.start();
            if !period.is_valid() || !contiguous {
                return Err(ScheduleError::InvalidDateRange {
                    start: first.start(),
                    end: last.end(),
                });
            }
        }
        Ok(Self { periods })
    }

    /// Returns the periods in the schedule.
    #[inline]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Returns the number of periods.
    #[inline]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Always false; schedules hold at least one period.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Accrual start of the first period.
    #[inline]
    pub fn start_date(&self) -> Date {
        self.periods[0].start()
    }

    /// Accrual end of the last period.
    #[inline]
    pub fn end_date(&self) -> Date {
        self.periods[self.periods.len() - 1].end()
    }

    /// Fixing date of period `i`.
    #[inline]
    pub fn fixing(&self, i: usize) -> Option<Date> {
        self.periods.get(i).map(Period::fixing)
    }

    /// Fixing date of the first period, the exercise date of an option on the swap.
    #[inline]
    pub fn first_fixing(&self) -> Date {
        self.periods[0].fixing()
    }

    /// Returns an iterator over the periods.
    pub fn iter(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter()
    }

    /// Accrual year fractions per period.
    pub fn period_lengths(&self) -> Vec<f64> {
        self.periods.iter().map(Period::year_fraction).collect()
    }

    /// Sum of accrual year fractions.
    pub fn total_year_fraction(&self) -> f64 {
        self.periods.iter().map(Period::year_fraction).sum()
    }

    /// Mean accrual year fraction.
    pub fn average_period_length(&self) -> f64 {
        self.total_year_fraction() / self.periods.len() as f64
    }

    /// Model times (ACT/365 from `reference`) of accrual starts.
    pub fn start_times(&self, reference: Date) -> Vec<f64> {
        self.periods
            .iter()
            .map(|p| time_to_maturity_dates(reference, p.start()))
            .collect()
    }

    /// Model times of accrual ends.
    pub fn end_times(&self, reference: Date) -> Vec<f64> {
        self.periods
            .iter()
            .map(|p| time_to_maturity_dates(reference, p.end()))
            .collect()
    }

    /// Model times of payments.
    pub fn payment_times(&self, reference: Date) -> Vec<f64> {
        self.periods.iter().map(|p| p.payment_time(reference)).collect()
    }
}

/// Builder rolling periods forward from a start date.
///
/// Period boundaries are `start + k·step` months, each clipped to month end
/// independently so that end-of-month anchors do not drift. A trailing
/// short stub is closed at the end date.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    start_date: Option<Date>,
    end_date: Option<Date>,
    frequency: Option<Frequency>,
    day_count: DayCountConvention,
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleBuilder {
    /// Creates a new schedule builder. Default day count is ACT/365.
    pub fn new() -> Self {
        Self {
            start_date: None,
            end_date: None,
            frequency: None,
            day_count: DayCountConvention::ActualActual365,
        }
    }

    /// Sets the start date of the schedule.
    pub fn start(mut self, date: Date) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Sets the end date of the schedule.
    pub fn end(mut self, date: Date) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Sets the payment frequency.
    pub fn frequency(mut self, freq: Frequency) -> Self {
        self.frequency = Some(freq);
        self
    }

    /// Sets the day count convention.
    pub fn day_count(mut self, dc: DayCountConvention) -> Self {
        self.day_count = dc;
        self
    }

    /// Builds the schedule.
    pub fn build(self) -> Result<Schedule, ScheduleError> {
        let start = self
            .start_date
            .ok_or(ScheduleError::MissingField { field: "start" })?;
        let end = self
            .end_date
            .ok_or(ScheduleError::MissingField { field: "end" })?;
        let frequency = self
            .frequency
            .ok_or(ScheduleError::MissingField { field: "frequency" })?;

        if start >= end {
            return Err(ScheduleError::InvalidDateRange { start, end });
        }

        let step = frequency.months_between_payments() as i32;
        let mut periods = Vec::new();
        let mut current = start;
        let mut k = 1;
        while current < end {
            let next = start.add_months(k * step)?.min(end);
            periods.push(Period::new(current, next, self.day_count));
            current = next;
            k += 1;
        }

        if periods.is_empty() {
            return Err(ScheduleError::NoPeriods { start, end });
        }
        Schedule::new(periods)
    }
}

/// Leg template turning (maturity, tenor) month offsets into a schedule.
///
/// ```
/// use pricer_models::schedules::{Frequency, SchedulePrototype};
/// use pricer_core::types::time::{Date, DayCountConvention};
///
/// let floating =
///     SchedulePrototype::new(Frequency::SemiAnnual, DayCountConvention::ActualActual360);
/// let reference = Date::from_ymd(2017, 8, 30).unwrap();
///
/// let schedule = floating.generate(reference, 12, 60).unwrap();
/// assert_eq!(schedule.len(), 10);
/// assert_eq!(schedule.first_fixing(), Date::from_ymd(2018, 8, 30).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulePrototype {
    /// Roll frequency of the leg.
    pub frequency: Frequency,
    /// Accrual day count of the leg.
    pub day_count: DayCountConvention,
}

impl SchedulePrototype {
    /// Creates a prototype.
    pub fn new(frequency: Frequency, day_count: DayCountConvention) -> Self {
        Self {
            frequency,
            day_count,
        }
    }

    /// Generates the leg of a swap starting `maturity_months` after
    /// `reference` and running for `tenor_months`.
    pub fn generate(
        &self,
        reference: Date,
        maturity_months: i32,
        tenor_months: i32,
    ) -> Result<Schedule, ScheduleError> {
        if maturity_months < 0 || tenor_months <= 0 {
            return Err(ScheduleError::InvalidOffset {
                maturity_months,
                tenor_months,
            });
        }
        let end_months = maturity_months
            .checked_add(tenor_months)
            .ok_or(ScheduleError::InvalidOffset {
                maturity_months,
                tenor_months,
            })?;
        ScheduleBuilder::new()
            .start(reference.add_months(maturity_months)?)
            .end(reference.add_months(end_months)?)
            .frequency(self.frequency)
            .day_count(self.day_count)
            .build()
    }
}
