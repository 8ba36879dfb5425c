//! Forward-starting swap: par rate, annuities and the cash annuity.

use pricer_core::market_data::YieldCurve;
use pricer_core::types::time::{time_to_maturity_dates, Date};

use super::error::SwaptionError;
use super::lattice::{LatticeMeta, Settlement};
use super::market::SwaptionMarket;
use crate::schedules::{Schedule, SchedulePrototype};

/// Cash-settlement annuity of a swap rate.
///
/// `(1 - (1 + Δr)^-N) / r` for `N` periods of average length `Δ`, with the
/// limit `N·Δ` at `r = 0`.
///
/// ```
/// use pricer_models::swaptions::cash_annuity;
///
/// assert_eq!(cash_annuity(0.0, 10, 1.0), 10.0);
/// assert!((cash_annuity(0.02, 10, 1.0) - 8.982585006).abs() < 1e-9);
/// ```
pub fn cash_annuity(rate: f64, periods: usize, average_period: f64) -> f64 {
    let n = periods as f64;
    if rate == 0.0 {
        return n * average_period;
    }
    (1.0 - (1.0 + average_period * rate).powf(-n)) / rate
}

/// Everything needed to set up the underlying swap of one swaption.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwaptionTerms {
    /// Valuation date.
    pub reference_date: Date,
    /// Months from the reference date to expiry.
    pub maturity_months: i32,
    /// Swap length in months.
    pub tenor_months: i32,
    /// Fixed-leg template.
    pub fixed_leg: SchedulePrototype,
    /// Floating-leg template.
    pub floating_leg: SchedulePrototype,
    /// Discounting curve name.
    pub discount_curve: String,
    /// Projection curve name.
    pub forward_curve: String,
}

impl SwaptionTerms {
    /// Generates both legs and prices the forward swap off the market curves.
    pub fn forward_swap(&self, market: &SwaptionMarket) -> Result<ForwardSwap, SwaptionError> {
        let fixed = self.fixed_leg.generate(
            self.reference_date,
            self.maturity_months,
            self.tenor_months,
        )?;
        let floating = self.floating_leg.generate(
            self.reference_date,
            self.maturity_months,
            self.tenor_months,
        )?;
        ForwardSwap::new(
            self.reference_date,
            &fixed,
            &floating,
            market.curve(&self.discount_curve)?,
            market.curve(&self.forward_curve)?,
        )
    }
}

impl LatticeMeta {
    /// Terms of the swaption at (maturity, tenor) in this lattice.
    pub fn terms(&self, maturity_months: i32, tenor_months: i32) -> SwaptionTerms {
        SwaptionTerms {
            reference_date: self.reference_date,
            maturity_months,
            tenor_months,
            fixed_leg: self.fixed_leg,
            floating_leg: self.floating_leg,
            discount_curve: self.discount_curve.clone(),
            forward_curve: self.forward_curve.clone(),
        }
    }
}

/// Fixed-leg payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCashflow {
    /// Accrual year fraction.
    pub accrual: f64,
    /// Payment time in years from the reference date.
    pub payment_time: f64,
    /// Discount factor to the payment time.
    pub discount: f64,
}

/// Floating-leg payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingCashflow {
    /// Accrual start time.
    pub start_time: f64,
    /// Accrual end time.
    pub end_time: f64,
    /// Payment time.
    pub payment_time: f64,
    /// Projection discount ratio `Pf(start) / Pf(end)`.
    pub projection_ratio: f64,
    /// Discount factor to the payment time.
    pub discount: f64,
}

/// Forward swap seen from the reference date.
///
/// The expiry of an option on the swap is the first fixing of the fixed
/// leg, which both legs share. Values are today's, not conditional on expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardSwap {
    expiry: f64,
    expiry_discount: f64,
    fixed: Vec<FixedCashflow>,
    floating: Vec<FloatingCashflow>,
    annuity: f64,
    floating_value: f64,
    par_rate: f64,
}

impl ForwardSwap {
    /// Prices both legs.
    ///
    /// Fails with `InvalidExpiry` when the first fixing is not after the
    /// reference date.
    pub fn new<D, F>(
        reference: Date,
        fixed: &Schedule,
        floating: &Schedule,
        discount: &D,
        forward: &F,
    ) -> Result<Self, SwaptionError>
    where
        D: YieldCurve<f64>,
        F: YieldCurve<f64>,
    {
        let expiry = time_to_maturity_dates(reference, fixed.first_fixing());
        if !(expiry > 0.0) {
            return Err(SwaptionError::InvalidExpiry { expiry });
        }
        let expiry_discount = discount.discount_factor(expiry)?;

        let fixed_flows = fixed
            .iter()
            .map(|p| {
                let payment_time = p.payment_time(reference);
                Ok(FixedCashflow {
                    accrual: p.year_fraction(),
                    payment_time,
                    discount: discount.discount_factor(payment_time)?,
                })
            })
            .collect::<Result<Vec<_>, SwaptionError>>()?;

        let floating_flows = floating
            .iter()
            .map(|p| {
                let start_time = time_to_maturity_dates(reference, p.start());
                let end_time = time_to_maturity_dates(reference, p.end());
                let payment_time = p.payment_time(reference);
                Ok(FloatingCashflow {
                    start_time,
                    end_time,
                    payment_time,
                    projection_ratio: forward.discount_factor(start_time)?
                        / forward.discount_factor(end_time)?,
                    discount: discount.discount_factor(payment_time)?,
                })
            })
            .collect::<Result<Vec<_>, SwaptionError>>()?;

        let annuity: f64 = fixed_flows.iter().map(|c| c.accrual * c.discount).sum();
        let floating_value: f64 = floating_flows
            .iter()
            .map(|c| (c.projection_ratio - 1.0) * c.discount)
            .sum();

        Ok(Self {
            expiry,
            expiry_discount,
            annuity,
            floating_value,
            par_rate: floating_value / annuity,
            fixed: fixed_flows,
            floating: floating_flows,
        })
    }

    /// Time to expiry in years (ACT/365).
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Discount factor to expiry.
    pub fn expiry_discount(&self) -> f64 {
        self.expiry_discount
    }

    /// Par swap rate.
    pub fn par_rate(&self) -> f64 {
        self.par_rate
    }

    /// Today's fixed-leg annuity `Σ τ_i P(0, t_i)`.
    pub fn annuity(&self) -> f64 {
        self.annuity
    }

    /// Today's floating-leg value.
    pub fn floating_value(&self) -> f64 {
        self.floating_value
    }

    /// Physical annuity forwarded to expiry, `A(0) / P(0, T)`.
    pub fn physical_annuity(&self) -> f64 {
        self.annuity / self.expiry_discount
    }

    /// Number of fixed periods.
    pub fn periods(&self) -> usize {
        self.fixed.len()
    }

    /// Mean fixed accrual.
    pub fn average_period(&self) -> f64 {
        self.fixed.iter().map(|c| c.accrual).sum::<f64>() / self.fixed.len() as f64
    }

    /// Cash annuity at an arbitrary swap rate.
    pub fn cash_annuity_at(&self, rate: f64) -> f64 {
        cash_annuity(rate, self.periods(), self.average_period())
    }

    /// Cash annuity at the par rate.
    pub fn cash_annuity(&self) -> f64 {
        self.cash_annuity_at(self.par_rate)
    }

    /// Annuity that converts option prices to rate space for a settlement type.
    pub fn settlement_annuity(&self, settlement: Settlement) -> f64 {
        match settlement {
            Settlement::Cash => self.cash_annuity(),
            Settlement::Physical => self.physical_annuity(),
        }
    }

    /// Fixed-leg cashflows.
    pub fn fixed_cashflows(&self) -> &[FixedCashflow] {
        &self.fixed
    }

    /// Floating-leg cashflows.
    pub fn floating_cashflows(&self) -> &[FloatingCashflow] {
        &self.floating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedules::Frequency;
    use approx::assert_relative_eq;
    use pricer_core::market_data::{CurveEnum, CurveSet};
    use pricer_core::types::time::DayCountConvention;

    fn reference() -> Date {
        Date::from_ymd(2017, 8, 30).unwrap()
    }

    fn terms(maturity: i32, tenor: i32, forward_curve: &str) -> SwaptionTerms {
        SwaptionTerms {
            reference_date: reference(),
            maturity_months: maturity,
            tenor_months: tenor,
            fixed_leg: SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360),
            floating_leg: SchedulePrototype::new(
                Frequency::SemiAnnual,
                DayCountConvention::ActualActual360,
            ),
            discount_curve: "discount".into(),
            forward_curve: forward_curve.into(),
        }
    }

    fn market() -> SwaptionMarket {
        SwaptionMarket::new(
            CurveSet::new()
                .with_curve("discount", CurveEnum::flat(0.01))
                .with_curve("forward", CurveEnum::flat(0.015)),
        )
    }

    #[test]
    fn test_expiry_is_first_fixing() {
        let t = terms(24, 120, "forward");
        let swap = t.forward_swap(&market()).unwrap();
        let fixed = t.fixed_leg.generate(reference(), 24, 120).unwrap();
        let floating = t.floating_leg.generate(reference(), 24, 120).unwrap();

        assert_eq!(fixed.first_fixing(), floating.first_fixing());
        assert_eq!(
            swap.expiry(),
            time_to_maturity_dates(reference(), fixed.first_fixing())
        );
        assert_relative_eq!(swap.expiry(), 730.0 / 365.0, epsilon = 1e-15);
    }

    #[test]
    fn test_cash_annuity_limit_is_exact() {
        let swap = terms(12, 120, "forward").forward_swap(&market()).unwrap();
        let limit = swap.periods() as f64 * swap.average_period();
        assert_eq!(swap.cash_annuity_at(0.0), limit);
        assert_eq!(cash_annuity(0.0, 7, 0.5), 3.5);
    }

    #[test]
    fn test_cash_annuity_is_continuous_at_zero() {
        let near = cash_annuity(1e-9, 10, 1.0);
        assert_relative_eq!(near, 10.0, max_relative = 1e-7);
    }

    #[test]
    fn test_single_curve_floating_leg_telescopes() {
        let swap = terms(24, 60, "discount").forward_swap(&market()).unwrap();
        let first = swap.floating_cashflows()[0];
        let last = swap.floating_cashflows()[swap.floating_cashflows().len() - 1];
        let curve = CurveEnum::flat(0.01);
        let expected = curve.discount_factor(first.start_time).unwrap()
            - curve.discount_factor(last.end_time).unwrap();
        assert_relative_eq!(swap.floating_value(), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_par_rate_and_annuities() {
        let swap = terms(12, 60, "forward").forward_swap(&market()).unwrap();

        assert_relative_eq!(swap.expiry(), 1.0, epsilon = 1e-12);
        assert_eq!(swap.periods(), 5);
        assert_relative_eq!(swap.average_period(), 1.0, epsilon = 1e-12);
        assert!(swap.par_rate() > 0.014 && swap.par_rate() < 0.017);
        assert_relative_eq!(
            swap.physical_annuity(),
            swap.annuity() / (-0.01_f64).exp(),
            epsilon = 1e-12
        );
        assert!(swap.cash_annuity() > 4.5 && swap.cash_annuity() < 5.0);
    }

    #[test]
    fn test_missing_curve() {
        let result = terms(12, 60, "libor").forward_swap(&market());
        assert!(matches!(result, Err(SwaptionError::MarketData(_))));
    }

    #[test]
    fn test_spot_starting_swap_has_no_expiry() {
        let result = terms(0, 60, "forward").forward_swap(&market());
        assert!(matches!(result, Err(SwaptionError::InvalidExpiry { .. })));
    }
}
