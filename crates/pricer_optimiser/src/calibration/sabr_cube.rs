//! SABR cube calibration to cash and physical swaption quotes.
//!
//! Each tenor is an independent least-squares problem over the SABR nodes
//! (rho, base vol, vol-of-vol) of its expiries. Cash-settled observations
//! are priced by replication, physical ones in closed form.

use std::collections::BTreeMap;

use pricer_core::market_data::{QuoteTable, TableConvention};
use pricer_core::math::solvers::{LMConfig, LevenbergMarquardtSolver};
use pricer_core::traits::ParameterBounds;
use pricer_core::types::time::Date;
use pricer_models::analytical::{Bachelier, OptionType};
use pricer_models::models::SABRModel;
use pricer_models::swaptions::{
    AnnuityMapping, AnnuityMappingType, ForwardSwap, IntegrationScheme, QuotingConvention,
    ReplicationGrid, ReplicationRange, SabrNode, SabrStructure, SabrVolatilityCube, Settlement,
    SwaptionError, SwaptionLattice, SwaptionMarket, SwaptionType, TenorSmile,
};
use tracing::{debug, info, warn};

use super::config::CubeCalibrationConfig;
use crate::OptimiserError;

/// Start values used where no override table has an entry.
const DEFAULT_RHO: f64 = 0.0;
const DEFAULT_BASE_VOL: f64 = 0.015;
const DEFAULT_VOL_VOL: f64 = 0.3;

/// Optional per-(maturity, tenor) start values, in months.
#[derive(Debug, Clone, Default)]
struct InitialOverrides {
    rho: Option<QuoteTable>,
    base_vol: Option<QuoteTable>,
    vol_vol: Option<QuoteTable>,
}

/// Calibrates a [`SabrVolatilityCube`] to three swaption lattices.
///
/// - cash-settled payers, any convention, read as `PAYER_PRICE`
/// - cash-settled receivers, read as `RECEIVER_PRICE`
/// - physically settled quotes (usually ATM), read as `PAYER_PRICE`
///
/// # Examples
///
/// ```rust,ignore
/// let cube = SabrCubeCalibrator::new(date, payers, receivers, atm, market, mapping, structure)
///     .set_calibration_parameters(100, 4)
///     .set_replication_parameters(true, -0.1, 0.1, 401)
///     .calibrate("EUR", &[12, 60, 120])?;
/// ```
#[derive(Debug, Clone)]
pub struct SabrCubeCalibrator {
    reference_date: Date,
    cash_payer: SwaptionLattice,
    cash_receiver: SwaptionLattice,
    physical: SwaptionLattice,
    market: SwaptionMarket,
    mapping: AnnuityMappingType,
    structure: SabrStructure,
    config: CubeCalibrationConfig,
    initial: InitialOverrides,
}

/// Input lattices in the conventions the residuals are measured in.
struct PreparedQuotes {
    cash_payer: SwaptionLattice,
    cash_receiver: SwaptionLattice,
    physical: SwaptionLattice,
}

enum Pricing {
    Cash(ReplicationGrid),
    Physical {
        option: OptionType,
        strike: f64,
        annuity: f64,
    },
}

/// One market quote and how to reprice it.
struct Observation {
    node: usize,
    forward: f64,
    expiry: f64,
    pricing: Pricing,
    market: f64,
    weight: f64,
}

impl Observation {
    fn model_value(
        &self,
        structure: &SabrStructure,
        node: &SabrNode,
    ) -> Result<f64, SwaptionError> {
        let model = SABRModel::new(structure.params(node), self.forward, self.expiry)?;
        match &self.pricing {
            Pricing::Cash(grid) => grid.evaluate(|k| Ok(model.normal_vol(k)?)),
            Pricing::Physical {
                option,
                strike,
                annuity,
            } => {
                let vol = model.normal_vol(*strike)?;
                let bachelier = Bachelier::new(self.forward, vol)?;
                Ok(annuity * bachelier.price(*option, *strike, self.expiry))
            }
        }
    }
}

impl SabrCubeCalibrator {
    /// Creates a calibrator with the default configuration.
    pub fn new(
        reference_date: Date,
        cash_payer: SwaptionLattice,
        cash_receiver: SwaptionLattice,
        physical: SwaptionLattice,
        market: SwaptionMarket,
        mapping: AnnuityMappingType,
        structure: SabrStructure,
    ) -> Self {
        Self {
            reference_date,
            cash_payer,
            cash_receiver,
            physical,
            market,
            mapping,
            structure,
            config: CubeCalibrationConfig::default(),
            initial: InitialOverrides::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: CubeCalibrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &CubeCalibrationConfig {
        &self.config
    }

    /// Iteration cap per tenor and worker count.
    pub fn set_calibration_parameters(mut self, max_iterations: usize, threads: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self.config.threads = threads;
        self
    }

    /// Replication domain and grid size.
    ///
    /// With `use_offset` the bounds are offsets from the forward swap rate,
    /// otherwise absolute rates.
    pub fn set_replication_parameters(
        mut self,
        use_offset: bool,
        lower: f64,
        upper: f64,
        points: usize,
    ) -> Self {
        self.config.replication.range = if use_offset {
            ReplicationRange::OffsetFromForward { lower, upper }
        } else {
            ReplicationRange::Absolute { lower, upper }
        };
        self.config.replication.points = points;
        self
    }

    /// Trapezoid instead of Simpson quadrature on the replication grid.
    pub fn set_use_linear_interpolation(mut self, linear: bool) -> Self {
        self.config.replication.scheme = if linear {
            IntegrationScheme::Linear
        } else {
            IntegrationScheme::HigherOrder
        };
        self
    }

    /// Start values per (maturity, tenor); missing entries use the defaults.
    ///
    /// Tables in years are re-keyed to months.
    pub fn set_initial_parameters(
        mut self,
        rhos: QuoteTable,
        base_vols: QuoteTable,
        vol_vols: QuoteTable,
    ) -> Result<Self, OptimiserError> {
        self.initial = InitialOverrides {
            rho: Some(rhos.to_convention(TableConvention::Months)?),
            base_vol: Some(base_vols.to_convention(TableConvention::Months)?),
            vol_vol: Some(vol_vols.to_convention(TableConvention::Months)?),
        };
        Ok(self)
    }

    /// Start node for (maturity, tenor) in months.
    pub fn initial_guess(&self, maturity: i32, tenor: i32) -> SabrNode {
        let lookup = |table: &Option<QuoteTable>, default: f64| {
            table
                .as_ref()
                .and_then(|t| t.value(maturity, tenor).ok())
                .unwrap_or(default)
        };
        SabrNode {
            rho: lookup(&self.initial.rho, DEFAULT_RHO),
            base_vol: lookup(&self.initial.base_vol, DEFAULT_BASE_VOL),
            vol_vol: lookup(&self.initial.vol_vol, DEFAULT_VOL_VOL),
        }
    }

    /// Calibrates every tenor and assembles the cube.
    ///
    /// Tenors run concurrently; any failing tenor fails the whole cube.
    pub fn calibrate(
        &self,
        name: &str,
        tenors: &[i32],
    ) -> Result<SabrVolatilityCube, OptimiserError> {
        self.config.validate()?;
        if tenors.is_empty() {
            return Err(OptimiserError::InvalidConfig(
                "no tenors to calibrate".to_string(),
            ));
        }

        info!(
            cube = name,
            tenors = ?tenors,
            threads = self.config.threads,
            mapping = %self.mapping,
            "starting SABR cube calibration"
        );

        let quotes = self.prepare_quotes()?;
        let smiles = self.calibrate_tenors(&quotes, tenors).map_err(|e| {
            warn!(cube = name, error = %e, "SABR cube calibration failed");
            e
        })?;

        info!(cube = name, tenors = smiles.len(), "SABR cube calibrated");
        Ok(SabrVolatilityCube::new(
            name,
            self.reference_date,
            self.structure,
            smiles,
        ))
    }

    #[cfg(feature = "parallel")]
    fn calibrate_tenors(
        &self,
        quotes: &PreparedQuotes,
        tenors: &[i32],
    ) -> Result<Vec<TenorSmile>, OptimiserError> {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| OptimiserError::ThreadPool(e.to_string()))?;

        pool.install(|| {
            tenors
                .par_iter()
                .map(|&tenor| self.calibrate_tenor(quotes, tenor))
                .collect()
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn calibrate_tenors(
        &self,
        quotes: &PreparedQuotes,
        tenors: &[i32],
    ) -> Result<Vec<TenorSmile>, OptimiserError> {
        tenors
            .iter()
            .map(|&tenor| self.calibrate_tenor(quotes, tenor))
            .collect()
    }

    fn prepare_quotes(&self) -> Result<PreparedQuotes, OptimiserError> {
        let prepare = |lattice: &SwaptionLattice,
                       settlement: Settlement,
                       convention: QuotingConvention|
         -> Result<SwaptionLattice, OptimiserError> {
            if lattice.settlement() != settlement {
                return Err(SwaptionError::InvalidConvention {
                    expected: settlement.to_string(),
                    found: lattice.settlement().to_string(),
                }
                .into());
            }
            if lattice.reference_date() != self.reference_date {
                return Err(OptimiserError::InvalidConfig(format!(
                    "lattice dated {} but calibrating at {}",
                    lattice.reference_date(),
                    self.reference_date
                )));
            }
            Ok(lattice.convert(convention, &self.market)?)
        };

        Ok(PreparedQuotes {
            cash_payer: prepare(
                &self.cash_payer,
                Settlement::Cash,
                QuotingConvention::PayerPrice,
            )?,
            cash_receiver: prepare(
                &self.cash_receiver,
                Settlement::Cash,
                QuotingConvention::ReceiverPrice,
            )?,
            physical: prepare(
                &self.physical,
                Settlement::Physical,
                QuotingConvention::PayerPrice,
            )?,
        })
    }

    /// Quotes of one tenor with the expiry nodes they load on.
    fn observations(
        &self,
        quotes: &PreparedQuotes,
        tenor: i32,
    ) -> Result<(Vec<i32>, Vec<Observation>), SwaptionError> {
        let maturities: Vec<i32> = {
            let mut all: Vec<i32> = [&quotes.cash_payer, &quotes.cash_receiver, &quotes.physical]
                .iter()
                .flat_map(|l| l.tenor_slice(tenor).map(|p| p.maturity))
                .collect();
            all.sort_unstable();
            all.dedup();
            all
        };
        let node_of = |maturity: i32| maturities.binary_search(&maturity).unwrap_or(0);

        let weights = &self.config.weights;
        let families = [
            (&quotes.cash_payer, SwaptionType::Payer, weights.cash_payer),
            (&quotes.cash_receiver, SwaptionType::Receiver, weights.cash_receiver),
            (&quotes.physical, SwaptionType::Payer, weights.physical),
        ];

        let mut observations = Vec::new();
        for (lattice, side, weight) in families {
            let cash = lattice.settlement() == Settlement::Cash;
            let mut swaps: BTreeMap<i32, (ForwardSwap, Option<AnnuityMapping>)> = BTreeMap::new();

            for point in lattice.tenor_slice(tenor) {
                if !swaps.contains_key(&point.maturity) {
                    let swap = lattice
                        .meta()
                        .terms(point.maturity, tenor)
                        .forward_swap(&self.market)?;
                    let mapping = if cash {
                        Some(AnnuityMapping::new(self.mapping, &swap, &self.structure)?)
                    } else {
                        None
                    };
                    swaps.insert(point.maturity, (swap, mapping));
                }
                let Some((swap, mapping)) = swaps.get(&point.maturity) else {
                    continue;
                };

                let strike = side.strike(swap.par_rate(), point.moneyness);
                let pricing = match mapping {
                    Some(mapping) => Pricing::Cash(ReplicationGrid::new(
                        side,
                        strike,
                        swap,
                        mapping,
                        &self.config.replication,
                        self.structure.displacement,
                    )?),
                    None => Pricing::Physical {
                        option: side.option_type(),
                        strike,
                        annuity: swap.physical_annuity(),
                    },
                };
                observations.push(Observation {
                    node: node_of(point.maturity),
                    forward: swap.par_rate(),
                    expiry: swap.expiry(),
                    pricing,
                    market: point.value,
                    weight,
                });
            }
        }

        Ok((maturities, observations))
    }

    fn calibrate_tenor(
        &self,
        quotes: &PreparedQuotes,
        tenor: i32,
    ) -> Result<TenorSmile, OptimiserError> {
        let tenor_failed = |source: SwaptionError| OptimiserError::TenorFailed { tenor, source };
        let (maturities, observations) = self.observations(quotes, tenor).map_err(tenor_failed)?;
        if observations.is_empty() {
            return Err(OptimiserError::NoObservations { tenor });
        }
        debug!(
            tenor,
            observations = observations.len(),
            nodes = maturities.len(),
            "calibrating tenor"
        );

        let bounds: Vec<ParameterBounds> = maturities
            .iter()
            .flat_map(|_| self.config.bounds.triple())
            .collect();
        let initial: Vec<f64> = maturities
            .iter()
            .flat_map(|&m| {
                let node = self.initial_guess(m, tenor);
                [node.rho, node.base_vol, node.vol_vol]
            })
            .collect();

        let structure = self.structure;
        let residuals = |params: &[f64]| -> Vec<f64> {
            let nodes = to_nodes(&ParameterBounds::clamp_all(&bounds, params));
            observations
                .iter()
                .map(|obs| match obs.model_value(&structure, &nodes[obs.node]) {
                    Ok(value) => obs.weight * (value - obs.market),
                    Err(_) => f64::NAN,
                })
                .collect()
        };

        let solver = LevenbergMarquardtSolver::new(
            LMConfig::default().with_max_iterations(self.config.max_iterations),
        );
        let fit = solver
            .solve_bounded(residuals, initial, &bounds)
            .map_err(|e| {
                warn!(tenor, error = %e, "solver failed");
                OptimiserError::SolverFailure {
                    tenor,
                    reason: e.to_string(),
                }
            })?;

        // A step stalled on a bound also reports convergence
        let rms = fit.rmse(observations.len());
        if rms > self.config.max_rms_error {
            warn!(
                tenor,
                rms,
                iterations = fit.iterations,
                converged = fit.converged,
                "fit above RMS target"
            );
            return Err(OptimiserError::SolverFailure {
                tenor,
                reason: format!(
                    "RMS residual {:.3e} above {:.3e} after {} iterations",
                    rms, self.config.max_rms_error, fit.iterations
                ),
            });
        }
        debug!(tenor, rms, iterations = fit.iterations, "tenor calibrated");

        let nodes = to_nodes(&fit.params);
        TenorSmile::new(tenor, maturities.into_iter().zip(nodes)).map_err(tenor_failed)
    }
}

/// Solver vector (rho, base vol, vol-of-vol per expiry) to nodes.
fn to_nodes(params: &[f64]) -> Vec<SabrNode> {
    params
        .chunks_exact(3)
        .map(|p| SabrNode {
            rho: p[0],
            base_vol: p[1],
            vol_vol: p[2],
        })
        .collect()
}
