//! Static replication of cash-settled swaptions.
//!
//! The payoff `h(s)(s - K)^+` with `h(s) = C(s)·w(s)` is decomposed into a
//! strip of vanilla options:
//!
//! ```text
//! payer:    h(K)·Call(K) + ∫_K^b f''(x)·Call(x) dx + f''(b)·½E[((S - b)^+)^2]
//! receiver: h(K)·Put(K)  + ∫_a^K f''(x)·Put(x)  dx + f''(a)·½E[((a - S)^+)^2]
//! ```
//!
//! The last term accounts for the payoff curvature beyond the grid.

use pricer_core::market_data::MarketDataError;
use pricer_core::math::quadrature::{uniform_grid, QuadratureRule};

use super::annuity::{AnnuityMapping, AnnuityMappingType};
use super::cube::SabrStructure;
use super::error::SwaptionError;
use super::market::SwaptionMarket;
use super::swap::{ForwardSwap, SwaptionTerms};
use super::SwaptionType;
use crate::analytical::{Bachelier, OptionType};
use crate::models::DISPLACED_STRIKE_FLOOR;

/// Finite-difference step for the payoff derivatives.
const DERIVATIVE_STEP: f64 = 5e-4;
/// Grid spans narrower than this collapse onto the strike.
const MIN_SPAN: f64 = 1e-12;

/// Integration domain in rate space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ReplicationRange {
    /// Fixed rate bounds.
    Absolute {
        /// Lowest rate.
        lower: f64,
        /// Highest rate.
        upper: f64,
    },
    /// Signed offsets added to the forward swap rate.
    OffsetFromForward {
        /// Offset of the lower bound (usually negative).
        lower: f64,
        /// Offset of the upper bound.
        upper: f64,
    },
}

impl ReplicationRange {
    /// Rate bounds for a forward, with the lower end kept above `-displacement`.
    pub fn bounds(&self, forward: f64, displacement: f64) -> (f64, f64) {
        let (lower, upper) = match *self {
            ReplicationRange::Absolute { lower, upper } => (lower, upper),
            ReplicationRange::OffsetFromForward { lower, upper } => {
                (forward + lower, forward + upper)
            }
        };
        (lower.max(-displacement + DISPLACED_STRIKE_FLOOR), upper)
    }
}

/// Quadrature used on the replication grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IntegrationScheme {
    /// Trapezoid rule.
    Linear,
    /// Composite Simpson rule.
    #[default]
    HigherOrder,
}

impl IntegrationScheme {
    /// Quadrature rule for the scheme.
    pub fn rule(&self) -> QuadratureRule {
        match self {
            IntegrationScheme::Linear => QuadratureRule::Trapezoid,
            IntegrationScheme::HigherOrder => QuadratureRule::Simpson,
        }
    }
}

/// Replication grid settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReplicationSettings {
    /// Integration domain.
    pub range: ReplicationRange,
    /// Number of evaluation points (at least two).
    pub points: usize,
    /// Quadrature scheme.
    pub scheme: IntegrationScheme,
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        Self {
            range: ReplicationRange::OffsetFromForward {
                lower: -0.1,
                upper: 0.1,
            },
            points: 401,
            scheme: IntegrationScheme::HigherOrder,
        }
    }
}

impl ReplicationSettings {
    /// Rejects grids with fewer than two points.
    pub fn validate(&self) -> Result<(), SwaptionError> {
        if self.points < 2 {
            return Err(SwaptionError::InvalidEvaluationPoints {
                points: self.points,
            });
        }
        Ok(())
    }
}

/// Volatility-independent part of a replication.
///
/// Holds the grid, the payoff curvature on it and the boundary term, so
/// the same swaption can be repriced under many smiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationGrid {
    option: OptionType,
    strike: f64,
    forward: f64,
    expiry: f64,
    strike_weight: f64,
    nodes: Vec<f64>,
    curvature: Vec<f64>,
    boundary: f64,
    boundary_curvature: f64,
    rule: QuadratureRule,
}

impl ReplicationGrid {
    /// Prepares the grid for one swaption.
    pub fn new(
        side: SwaptionType,
        strike: f64,
        swap: &ForwardSwap,
        mapping: &AnnuityMapping,
        settings: &ReplicationSettings,
        displacement: f64,
    ) -> Result<Self, SwaptionError> {
        settings.validate()?;

        let forward = swap.par_rate();
        let h = |s: f64| -> Result<f64, SwaptionError> {
            Ok(swap.cash_annuity_at(s) * mapping.weight(s)?)
        };
        let curvature_at = |x: f64| -> Result<f64, SwaptionError> {
            let (up, mid, down) = (h(x + DERIVATIVE_STEP)?, h(x)?, h(x - DERIVATIVE_STEP)?);
            let first = (up - down) / (2.0 * DERIVATIVE_STEP);
            let second = (up - 2.0 * mid + down) / (DERIVATIVE_STEP * DERIVATIVE_STEP);
            Ok(match side {
                SwaptionType::Payer => 2.0 * first + (x - strike) * second,
                SwaptionType::Receiver => -2.0 * first + (strike - x) * second,
            })
        };

        let (lower, upper) = settings.range.bounds(forward, displacement);
        let (from, to, boundary) = match side {
            SwaptionType::Payer => {
                let b = upper.max(strike);
                (strike, b, b)
            }
            SwaptionType::Receiver => {
                let a = lower.min(strike);
                (a, strike, a)
            }
        };

        let nodes = if to - from > MIN_SPAN {
            uniform_grid(from, to, settings.points)
        } else {
            Vec::new()
        };
        let curvature = nodes
            .iter()
            .map(|&x| curvature_at(x))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            option: side.option_type(),
            strike,
            forward,
            expiry: swap.expiry(),
            strike_weight: h(strike)?,
            nodes,
            curvature,
            boundary,
            boundary_curvature: curvature_at(boundary)?,
            rule: settings.scheme.rule(),
        })
    }

    /// Strike.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Forward swap rate.
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Time to expiry in years.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Integration nodes; empty when the domain collapses onto the strike.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Premium at expiry for a normal-volatility function of strike.
    pub fn evaluate<V>(&self, volatility: V) -> Result<f64, SwaptionError>
    where
        V: Fn(f64) -> Result<f64, SwaptionError>,
    {
        let model = |k: f64| -> Result<Bachelier, SwaptionError> {
            Ok(Bachelier::new(self.forward, volatility(k)?)?)
        };

        let at_strike = model(self.strike)?.price(self.option, self.strike, self.expiry);
        let mut value = self.strike_weight * at_strike;

        if self.nodes.len() >= 2 {
            let integrand = self
                .nodes
                .iter()
                .zip(&self.curvature)
                .map(|(&x, &c)| Ok(c * model(x)?.price(self.option, x, self.expiry)))
                .collect::<Result<Vec<_>, SwaptionError>>()?;
            value += self
                .rule
                .integrate(&self.nodes, &integrand)
                .map_err(MarketDataError::from)?;
        }

        let tail = model(self.boundary)?.second_moment(self.option, self.boundary, self.expiry);
        value += 0.5 * self.boundary_curvature * tail;
        Ok(value)
    }
}

/// Cash-settled swaption priced by replication against the cube smile.
#[derive(Debug, Clone, PartialEq)]
pub struct CashSettledSwaption {
    /// Payer or receiver.
    pub side: SwaptionType,
    /// Absolute strike.
    pub strike: f64,
    /// Underlying swap.
    pub terms: SwaptionTerms,
    /// Name of the volatility cube in the market.
    pub cube: String,
    /// Annuity mapping.
    pub mapping: AnnuityMappingType,
    /// Replication grid settings.
    pub replication: ReplicationSettings,
}

impl CashSettledSwaption {
    /// Swaption with default replication settings.
    pub fn new(
        side: SwaptionType,
        strike: f64,
        terms: SwaptionTerms,
        cube: impl Into<String>,
        mapping: AnnuityMappingType,
    ) -> Self {
        Self {
            side,
            strike,
            terms,
            cube: cube.into(),
            mapping,
            replication: ReplicationSettings::default(),
        }
    }

    /// Replaces the replication settings.
    pub fn with_replication(mut self, replication: ReplicationSettings) -> Self {
        self.replication = replication;
        self
    }

    /// Volatility-independent replication data.
    pub fn replication_grid(
        &self,
        swap: &ForwardSwap,
        structure: &SabrStructure,
    ) -> Result<ReplicationGrid, SwaptionError> {
        let mapping = AnnuityMapping::new(self.mapping, swap, structure)?;
        ReplicationGrid::new(
            self.side,
            self.strike,
            swap,
            &mapping,
            &self.replication,
            structure.displacement,
        )
    }

    /// Premium at expiry.
    pub fn value(&self, market: &SwaptionMarket) -> Result<f64, SwaptionError> {
        let cube = market.volatility_cube(&self.cube)?;
        let swap = self.terms.forward_swap(market)?;
        let grid = self.replication_grid(&swap, cube.structure())?;
        let model = cube.model(
            self.terms.maturity_months as f64,
            self.terms.tenor_months,
            swap.par_rate(),
            swap.expiry(),
        )?;
        grid.evaluate(|k| Ok(model.normal_vol(k)?))
    }
}

/// Physically settled swaption at the cube smile.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalSwaption {
    /// Payer or receiver.
    pub side: SwaptionType,
    /// Absolute strike.
    pub strike: f64,
    /// Underlying swap.
    pub terms: SwaptionTerms,
    /// Name of the volatility cube in the market.
    pub cube: String,
}

impl PhysicalSwaption {
    /// Creates the swaption.
    pub fn new(
        side: SwaptionType,
        strike: f64,
        terms: SwaptionTerms,
        cube: impl Into<String>,
    ) -> Self {
        Self {
            side,
            strike,
            terms,
            cube: cube.into(),
        }
    }

    /// Premium at expiry: forward physical annuity times the Bachelier value.
    pub fn value(&self, market: &SwaptionMarket) -> Result<f64, SwaptionError> {
        let cube = market.volatility_cube(&self.cube)?;
        let swap = self.terms.forward_swap(market)?;
        let vol = cube.normal_vol(
            self.terms.maturity_months as f64,
            self.terms.tenor_months,
            swap.par_rate(),
            self.strike,
            swap.expiry(),
        )?;
        let model = Bachelier::new(swap.par_rate(), vol)?;
        let price = model.price(self.side.option_type(), self.strike, swap.expiry());
        Ok(swap.physical_annuity() * price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytical::norm_pdf;
    use crate::schedules::{Frequency, SchedulePrototype};
    use crate::swaptions::{SabrNode, SabrVolatilityCube, TenorSmile};
    use approx::assert_relative_eq;
    use pricer_core::market_data::{CurveEnum, CurveSet};
    use pricer_core::types::time::{Date, DayCountConvention};

    const VOL: f64 = 0.006;

    fn terms() -> SwaptionTerms {
        SwaptionTerms {
            reference_date: Date::from_ymd(2017, 8, 30).unwrap(),
            maturity_months: 24,
            tenor_months: 120,
            fixed_leg: SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360),
            floating_leg: SchedulePrototype::new(
                Frequency::SemiAnnual,
                DayCountConvention::ActualActual360,
            ),
            discount_curve: "discount".into(),
            forward_curve: "forward".into(),
        }
    }

    /// Flat normal smile: beta = 0, nu = 0.
    fn market() -> SwaptionMarket {
        let structure = SabrStructure {
            beta: 0.0,
            ..SabrStructure::default()
        };
        let node = SabrNode {
            base_vol: VOL,
            vol_vol: 0.0,
            rho: 0.0,
        };
        let smile = TenorSmile::new(120, [(24, node)]).unwrap();
        let cube = SabrVolatilityCube::new(
            "EUR",
            Date::from_ymd(2017, 8, 30).unwrap(),
            structure,
            [smile],
        );
        SwaptionMarket::new(
            CurveSet::new()
                .with_curve("discount", CurveEnum::flat(0.01))
                .with_curve("forward", CurveEnum::flat(0.015)),
        )
        .with_volatility_cube(cube)
    }

    /// Direct quadrature of `E[h(S) payoff(S)]` under a normal terminal rate.
    fn brute_force(side: SwaptionType, strike: f64, mapping: AnnuityMappingType) -> f64 {
        let market = market();
        let swap = terms().forward_swap(&market).unwrap();
        let m = AnnuityMapping::new(mapping, &swap, &SabrStructure::default()).unwrap();
        let f = swap.par_rate();
        let sd = VOL * swap.expiry().sqrt();
        let xs = uniform_grid(f - 10.0 * sd, f + 10.0 * sd, 20_001);
        let ys: Vec<f64> = xs
            .iter()
            .map(|&s| {
                let payoff = match side {
                    SwaptionType::Payer => (s - strike).max(0.0),
                    SwaptionType::Receiver => (strike - s).max(0.0),
                };
                let density = norm_pdf((s - f) / sd) / sd;
                swap.cash_annuity_at(s) * m.weight(s).unwrap() * payoff * density
            })
            .collect();
        QuadratureRule::Trapezoid.integrate(&xs, &ys).unwrap()
    }

    #[test]
    fn test_replication_matches_direct_expectation() {
        let market = market();
        let f = terms().forward_swap(&market).unwrap().par_rate();
        for side in [SwaptionType::Payer, SwaptionType::Receiver] {
            for offset in [-0.005, 0.0, 0.01] {
                let strike = f + offset;
                let swaption = CashSettledSwaption::new(
                    side,
                    strike,
                    terms(),
                    "EUR",
                    AnnuityMappingType::MultiPiterbarg,
                );
                let replicated = swaption.value(&market).unwrap();
                let direct = brute_force(side, strike, AnnuityMappingType::MultiPiterbarg);
                assert_relative_eq!(replicated, direct, max_relative = 1e-4);
            }
        }
    }

    #[test]
    fn test_linear_scheme_is_close_to_simpson() {
        let market = market();
        let f = terms().forward_swap(&market).unwrap().par_rate();
        let base = CashSettledSwaption::new(
            SwaptionType::Payer,
            f + 0.0025,
            terms(),
            "EUR",
            AnnuityMappingType::MultiPiterbarg,
        );
        let linear = base.clone().with_replication(ReplicationSettings {
            scheme: IntegrationScheme::Linear,
            ..ReplicationSettings::default()
        });
        assert_relative_eq!(
            base.value(&market).unwrap(),
            linear.value(&market).unwrap(),
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_strike_beyond_range_uses_boundary_only() {
        let market = market();
        let f = terms().forward_swap(&market).unwrap().par_rate();
        let swaption = CashSettledSwaption::new(
            SwaptionType::Payer,
            f + 0.2,
            terms(),
            "EUR",
            AnnuityMappingType::BasicPiterbarg,
        );
        let swap = terms().forward_swap(&market).unwrap();
        let grid = swaption
            .replication_grid(&swap, &SabrStructure::default())
            .unwrap();
        assert!(grid.nodes().is_empty());
        assert!(swaption.value(&market).unwrap() >= 0.0);
    }

    #[test]
    fn test_too_few_points() {
        let swaption = CashSettledSwaption::new(
            SwaptionType::Payer,
            0.02,
            terms(),
            "EUR",
            AnnuityMappingType::BasicPiterbarg,
        )
        .with_replication(ReplicationSettings {
            points: 1,
            ..ReplicationSettings::default()
        });
        assert_eq!(
            swaption.value(&market()),
            Err(SwaptionError::InvalidEvaluationPoints { points: 1 })
        );
    }

    #[test]
    fn test_missing_tenor_and_cube() {
        let mut other = terms();
        other.tenor_months = 60;
        let missing_tenor = CashSettledSwaption::new(
            SwaptionType::Payer,
            0.02,
            other,
            "EUR",
            AnnuityMappingType::BasicPiterbarg,
        );
        assert!(matches!(
            missing_tenor.value(&market()),
            Err(SwaptionError::MissingCubeTenor { tenor: 60, .. })
        ));

        let missing_cube = PhysicalSwaption::new(SwaptionType::Payer, 0.02, terms(), "USD");
        assert!(matches!(
            missing_cube.value(&market()),
            Err(SwaptionError::CubeNotFound { .. })
        ));
    }

    #[test]
    fn test_physical_put_call_parity() {
        let market = market();
        let swap = terms().forward_swap(&market).unwrap();
        let strike = swap.par_rate() + 0.004;
        let payer = PhysicalSwaption::new(SwaptionType::Payer, strike, terms(), "EUR");
        let receiver = PhysicalSwaption::new(SwaptionType::Receiver, strike, terms(), "EUR");
        let parity = payer.value(&market).unwrap() - receiver.value(&market).unwrap();
        assert_relative_eq!(
            parity,
            swap.physical_annuity() * (swap.par_rate() - strike),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_range_floor() {
        let range = ReplicationRange::Absolute {
            lower: -1.0,
            upper: 0.2,
        };
        let (lower, upper) = range.bounds(0.02, 0.25);
        assert!(lower > -0.25 && lower < -0.2499);
        assert_eq!(upper, 0.2);

        let offset = ReplicationRange::OffsetFromForward {
            lower: -0.05,
            upper: 0.05,
        };
        let (lower, upper) = offset.bounds(0.02, 0.25);
        assert_relative_eq!(lower, -0.03);
        assert_relative_eq!(upper, 0.07);
    }
}
