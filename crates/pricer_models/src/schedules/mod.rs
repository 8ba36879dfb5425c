//! Swap-leg schedules generated from month offsets.
//!
//! - [`Period`]: one accrual period, fixed at its start and paid at its end
//! - [`Schedule`]: contiguous periods with model-time accessors
//! - [`ScheduleBuilder`]: rolls a schedule between two dates
//! - [`SchedulePrototype`]: leg template keyed by (maturity, tenor) offsets
//!
//! # Examples
//!
//! ```
//! use pricer_models::schedules::{Frequency, SchedulePrototype};
//! use pricer_core::types::time::{Date, DayCountConvention};
//!
//! let fixed = SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360);
//! let schedule = fixed
//!     .generate(Date::from_ymd(2017, 8, 30).unwrap(), 12, 60)
//!     .unwrap();
//!
//! assert_eq!(schedule.len(), 5);
//! ```

mod error;
mod frequency;
mod period;
mod schedule;

pub use error::ScheduleError;
pub use frequency::Frequency;
pub use period::Period;
pub use schedule::{Schedule, ScheduleBuilder, SchedulePrototype};
