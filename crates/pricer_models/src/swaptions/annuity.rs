//! Annuity mapping functions for cash-settled swaption replication.
//!
//! A mapping gives the ratio of the expected discounted annuity, conditional
//! on the swap rate fixing at `s`, to its unconditional value. It is
//! normalised to one at the forward swap rate.

use std::fmt;
use std::str::FromStr;

use pricer_core::math::solvers::{BrentSolver, SolverConfig};
use pricer_core::types::SolverError;

use super::cube::SabrStructure;
use super::error::SwaptionError;
use super::swap::ForwardSwap;

/// Half-width of the first bracket around the one-factor state guess.
const STATE_BRACKET: f64 = 0.05;
/// Bracket doublings before giving up.
const MAX_BRACKET_EXPANSIONS: usize = 40;
/// Step of the central difference for the linear mapping slope.
const SLOPE_STEP: f64 = 1e-5;
/// Mean reversion below which the loading is taken as `τ`.
const KAPPA_EPSILON: f64 = 1e-10;

/// Annuity mapping model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnnuityMappingType {
    /// Ratio of the cash annuity at the forward to the cash annuity at `s`.
    BasicPiterbarg,
    /// One-factor Gaussian curve with forward/discount decorrelation.
    #[default]
    MultiPiterbarg,
    /// First-order expansion of the basic mapping around the forward.
    SimplifiedLinear,
}

impl AnnuityMappingType {
    /// Configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            AnnuityMappingType::BasicPiterbarg => "basic_piterbarg",
            AnnuityMappingType::MultiPiterbarg => "multi_piterbarg",
            AnnuityMappingType::SimplifiedLinear => "simplified_linear",
        }
    }
}

impl fmt::Display for AnnuityMappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AnnuityMappingType {
    type Err = SwaptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "basic_piterbarg" | "basic" => Ok(AnnuityMappingType::BasicPiterbarg),
            "multi_piterbarg" | "multi" => Ok(AnnuityMappingType::MultiPiterbarg),
            "simplified_linear" | "linear" => Ok(AnnuityMappingType::SimplifiedLinear),
            _ => Err(SwaptionError::InvalidConvention {
                expected: "basic_piterbarg, multi_piterbarg or simplified_linear".into(),
                found: s.to_string(),
            }),
        }
    }
}

/// Annuity mapping bound to one forward swap.
#[derive(Debug, Clone)]
pub struct AnnuityMapping {
    kind: AnnuityMappingType,
    forward: f64,
    model: MappingModel,
}

#[derive(Debug, Clone)]
enum MappingModel {
    Basic {
        periods: usize,
        average_period: f64,
        at_forward: f64,
    },
    Linear {
        slope: f64,
    },
    OneFactor(OneFactorCurve),
}

impl AnnuityMapping {
    /// Prepares the mapping for a swap.
    pub fn new(
        kind: AnnuityMappingType,
        swap: &ForwardSwap,
        structure: &SabrStructure,
    ) -> Result<Self, SwaptionError> {
        let forward = swap.par_rate();
        let model = match kind {
            AnnuityMappingType::BasicPiterbarg => MappingModel::Basic {
                periods: swap.periods(),
                average_period: swap.average_period(),
                at_forward: swap.cash_annuity(),
            },
            AnnuityMappingType::SimplifiedLinear => {
                let up = swap.cash_annuity_at(forward + SLOPE_STEP);
                let down = swap.cash_annuity_at(forward - SLOPE_STEP);
                let derivative = (up - down) / (2.0 * SLOPE_STEP);
                MappingModel::Linear {
                    slope: -derivative / swap.cash_annuity(),
                }
            }
            AnnuityMappingType::MultiPiterbarg => {
                MappingModel::OneFactor(OneFactorCurve::new(swap, structure))
            }
        };
        Ok(Self {
            kind,
            forward,
            model,
        })
    }

    /// Mapping model.
    pub fn kind(&self) -> AnnuityMappingType {
        self.kind
    }

    /// Forward swap rate the mapping is normalised at.
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Mapping weight `w(s)`; `w(forward) = 1`.
    pub fn weight(&self, rate: f64) -> Result<f64, SwaptionError> {
        match &self.model {
            MappingModel::Basic {
                periods,
                average_period,
                at_forward,
            } => {
                let annuity = super::swap::cash_annuity(rate, *periods, *average_period);
                Ok(at_forward / annuity)
            }
            MappingModel::Linear { slope } => Ok(1.0 + slope * (rate - self.forward)),
            MappingModel::OneFactor(curve) => {
                let state = curve.state_for_rate(rate, self.forward)?;
                Ok(curve.annuity(0.0) / curve.annuity(state))
            }
        }
    }
}

/// Discount bonds seen from expiry under a one-factor Gaussian shift `x`.
///
/// `P(T, t | x) = P(0, t) / P(0, T) · exp(-x·G(t - T))` with
/// `G(τ) = (1 - e^{-κτ}) / κ`. Projection ratios load on the same factor,
/// scaled by the basis decorrelation.
#[derive(Debug, Clone)]
struct OneFactorCurve {
    fixed: Vec<(f64, f64, f64)>,
    floating: Vec<FloatingState>,
}

#[derive(Debug, Clone, Copy)]
struct FloatingState {
    ratio: f64,
    ratio_loading: f64,
    bond: f64,
    loading: f64,
}

impl OneFactorCurve {
    fn new(swap: &ForwardSwap, structure: &SabrStructure) -> Self {
        let kappa = structure.correlation_decay;
        let psi = structure.basis_decorrelation;
        let expiry = swap.expiry();
        let to_expiry = swap.expiry_discount();
        let g = |t: f64| loading(kappa, t - expiry);

        let fixed = swap
            .fixed_cashflows()
            .iter()
            .map(|c| (c.accrual, c.discount / to_expiry, g(c.payment_time)))
            .collect();
        let floating = swap
            .floating_cashflows()
            .iter()
            .map(|c| FloatingState {
                ratio: c.projection_ratio,
                ratio_loading: psi * (g(c.end_time) - g(c.start_time)),
                bond: c.discount / to_expiry,
                loading: g(c.payment_time),
            })
            .collect();

        Self { fixed, floating }
    }

    fn annuity(&self, x: f64) -> f64 {
        self.fixed
            .iter()
            .map(|&(accrual, bond, g)| accrual * bond * (-x * g).exp())
            .sum()
    }

    fn swap_rate(&self, x: f64) -> f64 {
        let floating: f64 = self
            .floating
            .iter()
            .map(|c| {
                (c.ratio * (x * c.ratio_loading).exp() - 1.0) * c.bond * (-x * c.loading).exp()
            })
            .sum();
        floating / self.annuity(x)
    }

    /// State at which the conditional swap rate equals `rate`.
    fn state_for_rate(&self, rate: f64, forward: f64) -> Result<f64, SwaptionError> {
        let objective = |x: f64| self.swap_rate(x) - rate;
        let centre = rate - forward;
        let mut width = STATE_BRACKET;
        for _ in 0..MAX_BRACKET_EXPANSIONS {
            let (lo, hi) = (centre - width, centre + width);
            let (f_lo, f_hi) = (objective(lo), objective(hi));
            if f_lo.is_finite() && f_hi.is_finite() && f_lo * f_hi <= 0.0 {
                let solver = BrentSolver::new(SolverConfig::new(1e-13, 200));
                return Ok(solver.find_root(objective, lo, hi)?);
            }
            width *= 2.0;
        }
        Err(SolverError::NoBracket {
            a: centre - width,
            b: centre + width,
        }
        .into())
    }
}

fn loading(kappa: f64, tau: f64) -> f64 {
    if kappa.abs() < KAPPA_EPSILON {
        tau
    } else {
        (1.0 - (-kappa * tau).exp()) / kappa
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedules::{Frequency, SchedulePrototype};
    use crate::swaptions::{SwaptionMarket, SwaptionTerms};
    use approx::assert_relative_eq;
    use pricer_core::market_data::{CurveEnum, CurveSet};
    use pricer_core::types::time::{Date, DayCountConvention};

    fn swap(forward_rate: f64) -> ForwardSwap {
        let market = SwaptionMarket::new(
            CurveSet::new()
                .with_curve("discount", CurveEnum::flat(0.01))
                .with_curve("forward", CurveEnum::flat(forward_rate)),
        );
        SwaptionTerms {
            reference_date: Date::from_ymd(2017, 8, 30).unwrap(),
            maturity_months: 60,
            tenor_months: 120,
            fixed_leg: SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360),
            floating_leg: SchedulePrototype::new(
                Frequency::SemiAnnual,
                DayCountConvention::ActualActual360,
            ),
            discount_curve: "discount".into(),
            forward_curve: "forward".into(),
        }
        .forward_swap(&market)
        .unwrap()
    }

    fn mapping(kind: AnnuityMappingType, swap: &ForwardSwap) -> AnnuityMapping {
        AnnuityMapping::new(kind, swap, &SabrStructure::default()).unwrap()
    }

    #[test]
    fn test_unit_weight_at_forward() {
        let swap = swap(0.015);
        for kind in [
            AnnuityMappingType::BasicPiterbarg,
            AnnuityMappingType::MultiPiterbarg,
            AnnuityMappingType::SimplifiedLinear,
        ] {
            let w = mapping(kind, &swap).weight(swap.par_rate()).unwrap();
            assert_relative_eq!(w, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_weights_increase_with_rate() {
        let swap = swap(0.015);
        let f = swap.par_rate();
        for kind in [
            AnnuityMappingType::BasicPiterbarg,
            AnnuityMappingType::MultiPiterbarg,
            AnnuityMappingType::SimplifiedLinear,
        ] {
            let m = mapping(kind, &swap);
            let low = m.weight(f - 0.01).unwrap();
            let high = m.weight(f + 0.01).unwrap();
            assert!(low < 1.0 && high > 1.0, "{kind}: {low} {high}");
        }
    }

    #[test]
    fn test_linear_mapping_is_tangent_to_basic() {
        let swap = swap(0.015);
        let f = swap.par_rate();
        let basic = mapping(AnnuityMappingType::BasicPiterbarg, &swap);
        let linear = mapping(AnnuityMappingType::SimplifiedLinear, &swap);

        let h = 1e-4;
        let basic_slope = (basic.weight(f + h).unwrap() - basic.weight(f - h).unwrap()) / (2.0 * h);
        let linear_slope =
            (linear.weight(f + h).unwrap() - linear.weight(f - h).unwrap()) / (2.0 * h);
        assert_relative_eq!(basic_slope, linear_slope, max_relative = 1e-4);
    }

    #[test]
    fn test_one_factor_state_reproduces_rate() {
        let swap = swap(0.02);
        let curve = OneFactorCurve::new(&swap, &SabrStructure::default());
        assert_relative_eq!(curve.swap_rate(0.0), swap.par_rate(), epsilon = 1e-14);

        for target in [-0.05, 0.0, 0.03, 0.12] {
            let x = curve.state_for_rate(target, swap.par_rate()).unwrap();
            assert_relative_eq!(curve.swap_rate(x), target, epsilon = 1e-11);
        }
    }

    #[test]
    fn test_zero_mean_reversion_loading() {
        assert_eq!(loading(0.0, 3.0), 3.0);
        assert_relative_eq!(loading(1e-6, 3.0), 3.0, max_relative = 1e-5);
    }

    #[test]
    fn test_parse_mapping_type() {
        assert_eq!(
            "multi-piterbarg".parse::<AnnuityMappingType>().unwrap(),
            AnnuityMappingType::MultiPiterbarg
        );
        assert_eq!(
            "LINEAR".parse::<AnnuityMappingType>().unwrap(),
            AnnuityMappingType::SimplifiedLinear
        );
        assert!("quadratic".parse::<AnnuityMappingType>().is_err());
    }
}
