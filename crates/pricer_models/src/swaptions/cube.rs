//! SABR volatility cube: one smile per swap tenor, nodes per expiry.

use std::collections::BTreeMap;

use pricer_core::market_data::MarketDataError;
use pricer_core::math::interpolators::LinearInterpolator;
use pricer_core::types::time::Date;

use super::error::SwaptionError;
use crate::models::{SABRModel, SABRParams};

/// Structural SABR parameters shared by every smile of a cube.
///
/// These are fixed inputs of a calibration, not calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SabrStructure {
    /// Rate displacement.
    pub displacement: f64,
    /// CEV exponent.
    pub beta: f64,
    /// Mean reversion of the one-factor annuity-mapping model.
    pub correlation_decay: f64,
    /// Loading of the forward curve on the discount factor.
    pub basis_decorrelation: f64,
}

impl Default for SabrStructure {
    fn default() -> Self {
        Self {
            displacement: 0.25,
            beta: 0.5,
            correlation_decay: 0.045,
            basis_decorrelation: 1.2,
        }
    }
}

impl SabrStructure {
    /// Full SABR parameter set for one calibrated node.
    pub fn params(&self, node: &SabrNode) -> SABRParams {
        SABRParams {
            alpha: node.base_vol,
            nu: node.vol_vol,
            rho: node.rho,
            beta: self.beta,
            displacement: self.displacement,
        }
    }
}

/// Calibrated parameters of one (expiry, tenor) smile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SabrNode {
    /// Base volatility (alpha).
    pub base_vol: f64,
    /// Volatility of volatility (nu).
    pub vol_vol: f64,
    /// Forward/volatility correlation.
    pub rho: f64,
}

/// SABR nodes of one tenor keyed by maturity in months.
///
/// Between nodes each parameter is interpolated linearly in maturity;
/// beyond the first and last node it is held flat.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SmileRecord", into = "SmileRecord")
)]
pub struct TenorSmile {
    tenor: i32,
    nodes: BTreeMap<i32, SabrNode>,
    shape: SmileShape,
}

#[derive(Debug, Clone, PartialEq)]
enum SmileShape {
    Constant(SabrNode),
    Linear([LinearInterpolator<f64>; 3]),
}

impl TenorSmile {
    /// Builds a smile from (maturity months, node) pairs.
    ///
    /// Fails with `EmptySmile` when no node is given.
    pub fn new<I>(tenor: i32, nodes: I) -> Result<Self, SwaptionError>
    where
        I: IntoIterator<Item = (i32, SabrNode)>,
    {
        let nodes: BTreeMap<i32, SabrNode> = nodes.into_iter().collect();
        let shape = match nodes.values().next() {
            None => return Err(SwaptionError::EmptySmile { tenor }),
            Some(only) if nodes.len() == 1 => SmileShape::Constant(*only),
            Some(_) => {
                let xs: Vec<f64> = nodes.keys().map(|&m| m as f64).collect();
                let column =
                    |f: fn(&SabrNode) -> f64| -> Result<LinearInterpolator<f64>, SwaptionError> {
                        let ys: Vec<f64> = nodes.values().map(f).collect();
                        LinearInterpolator::new(&xs, &ys)
                            .map_err(|e| MarketDataError::from(e).into())
                    };
                SmileShape::Linear([
                    column(|n| n.base_vol)?,
                    column(|n| n.vol_vol)?,
                    column(|n| n.rho)?,
                ])
            }
        };

        Ok(Self {
            tenor,
            nodes,
            shape,
        })
    }

    /// Swap tenor in months.
    pub fn tenor(&self) -> i32 {
        self.tenor
    }

    /// Node maturities in months, ascending.
    pub fn maturities(&self) -> Vec<i32> {
        self.nodes.keys().copied().collect()
    }

    /// Calibrated nodes.
    pub fn nodes(&self) -> &BTreeMap<i32, SabrNode> {
        &self.nodes
    }

    /// Node at an exact maturity.
    pub fn node(&self, maturity: i32) -> Option<&SabrNode> {
        self.nodes.get(&maturity)
    }

    /// Parameters at any maturity in months.
    pub fn interpolate(&self, maturity_months: f64) -> SabrNode {
        match &self.shape {
            SmileShape::Constant(node) => *node,
            SmileShape::Linear([base, volvol, rho]) => SabrNode {
                base_vol: base.interpolate_flat(maturity_months),
                vol_vol: volvol.interpolate_flat(maturity_months),
                rho: rho.interpolate_flat(maturity_months),
            },
        }
    }
}

/// Calibrated SABR cube.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
/// use pricer_models::swaptions::{SabrNode, SabrStructure, SabrVolatilityCube, TenorSmile};
///
/// let node = |base_vol| SabrNode { base_vol, vol_vol: 0.3, rho: -0.1 };
/// let smile = TenorSmile::new(60, [(12, node(0.010)), (24, node(0.014))]).unwrap();
/// let cube = SabrVolatilityCube::new(
///     "EUR",
///     Date::from_ymd(2017, 8, 30).unwrap(),
///     SabrStructure::default(),
///     [smile],
/// );
///
/// let mid = cube.sabr_params(18.0, 60).unwrap();
/// assert!((mid.alpha - 0.012).abs() < 1e-15);
/// assert!(cube.sabr_params(18.0, 120).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "CubeRecord", into = "CubeRecord")
)]
pub struct SabrVolatilityCube {
    name: String,
    reference_date: Date,
    structure: SabrStructure,
    smiles: BTreeMap<i32, TenorSmile>,
}

impl SabrVolatilityCube {
    /// Assembles a cube; a repeated tenor keeps the last smile.
    pub fn new<I>(
        name: impl Into<String>,
        reference_date: Date,
        structure: SabrStructure,
        smiles: I,
    ) -> Self
    where
        I: IntoIterator<Item = TenorSmile>,
    {
        Self {
            name: name.into(),
            reference_date,
            structure,
            smiles: smiles.into_iter().map(|s| (s.tenor, s)).collect(),
        }
    }

    /// Cube name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Valuation date.
    pub fn reference_date(&self) -> Date {
        self.reference_date
    }

    /// Structural parameters.
    pub fn structure(&self) -> &SabrStructure {
        &self.structure
    }

    /// Calibrated tenors in months, ascending.
    pub fn tenors(&self) -> Vec<i32> {
        self.smiles.keys().copied().collect()
    }

    /// Smile of one tenor.
    pub fn smile(&self, tenor: i32) -> Result<&TenorSmile, SwaptionError> {
        self.smiles
            .get(&tenor)
            .ok_or_else(|| SwaptionError::MissingCubeTenor {
                cube: self.name.clone(),
                tenor,
            })
    }

    /// SABR parameters at (maturity months, tenor).
    pub fn sabr_params(
        &self,
        maturity_months: f64,
        tenor: i32,
    ) -> Result<SABRParams, SwaptionError> {
        let node = self.smile(tenor)?.interpolate(maturity_months);
        Ok(self.structure.params(&node))
    }

    /// Smile model bound to a forward and an expiry in years.
    pub fn model(
        &self,
        maturity_months: f64,
        tenor: i32,
        forward: f64,
        expiry: f64,
    ) -> Result<SABRModel, SwaptionError> {
        let params = self.sabr_params(maturity_months, tenor)?;
        Ok(SABRModel::new(params, forward, expiry)?)
    }

    /// Normal volatility at a strike.
    pub fn normal_vol(
        &self,
        maturity_months: f64,
        tenor: i32,
        forward: f64,
        strike: f64,
        expiry: f64,
    ) -> Result<f64, SwaptionError> {
        Ok(self
            .model(maturity_months, tenor, forward, expiry)?
            .normal_vol(strike)?)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct NodeRecord {
    maturity: i32,
    #[serde(flatten)]
    node: SabrNode,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SmileRecord {
    tenor: i32,
    nodes: Vec<NodeRecord>,
}

#[cfg(feature = "serde")]
impl TryFrom<SmileRecord> for TenorSmile {
    type Error = SwaptionError;

    fn try_from(record: SmileRecord) -> Result<Self, Self::Error> {
        TenorSmile::new(
            record.tenor,
            record.nodes.into_iter().map(|r| (r.maturity, r.node)),
        )
    }
}

#[cfg(feature = "serde")]
impl From<TenorSmile> for SmileRecord {
    fn from(smile: TenorSmile) -> Self {
        SmileRecord {
            tenor: smile.tenor,
            nodes: smile
                .nodes
                .into_iter()
                .map(|(maturity, node)| NodeRecord { maturity, node })
                .collect(),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct CubeRecord {
    name: String,
    reference_date: Date,
    structure: SabrStructure,
    smiles: Vec<TenorSmile>,
}

#[cfg(feature = "serde")]
impl From<CubeRecord> for SabrVolatilityCube {
    fn from(record: CubeRecord) -> Self {
        SabrVolatilityCube::new(record.name, record.reference_date, record.structure, record.smiles)
    }
}

#[cfg(feature = "serde")]
impl From<SabrVolatilityCube> for CubeRecord {
    fn from(cube: SabrVolatilityCube) -> Self {
        CubeRecord {
            name: cube.name,
            reference_date: cube.reference_date,
            structure: cube.structure,
            smiles: cube.smiles.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn node(base_vol: f64, vol_vol: f64, rho: f64) -> SabrNode {
        SabrNode {
            base_vol,
            vol_vol,
            rho,
        }
    }

    fn cube() -> SabrVolatilityCube {
        let short = TenorSmile::new(12, [(12, node(0.01, 0.2, -0.1))]).unwrap();
        let long = TenorSmile::new(
            120,
            [(12, node(0.02, 0.4, -0.2)), (60, node(0.03, 0.2, 0.2))],
        )
        .unwrap();
        SabrVolatilityCube::new(
            "test",
            Date::from_ymd(2017, 8, 30).unwrap(),
            SabrStructure::default(),
            [short, long],
        )
    }

    #[test]
    fn test_default_structure() {
        let s = SabrStructure::default();
        assert_eq!(s.displacement, 0.25);
        assert_eq!(s.beta, 0.5);
        assert_eq!(s.correlation_decay, 0.045);
        assert_eq!(s.basis_decorrelation, 1.2);
    }

    #[test]
    fn test_single_node_smile_is_constant() {
        let cube = cube();
        for m in [1.0, 12.0, 240.0] {
            let p = cube.sabr_params(m, 12).unwrap();
            assert_eq!(p.alpha, 0.01);
            assert_eq!(p.rho, -0.1);
        }
    }

    #[test]
    fn test_interpolation_linear_inside_flat_outside() {
        let cube = cube();
        let mid = cube.sabr_params(36.0, 120).unwrap();
        assert_relative_eq!(mid.alpha, 0.025, epsilon = 1e-15);
        assert_relative_eq!(mid.nu, 0.3, epsilon = 1e-15);
        assert_relative_eq!(mid.rho, 0.0, epsilon = 1e-15);

        assert_eq!(cube.sabr_params(1.0, 120).unwrap().alpha, 0.02);
        assert_eq!(cube.sabr_params(360.0, 120).unwrap().alpha, 0.03);
    }

    #[test]
    fn test_missing_tenor() {
        assert_eq!(
            cube().smile(60).unwrap_err(),
            SwaptionError::MissingCubeTenor {
                cube: "test".into(),
                tenor: 60
            }
        );
    }

    #[test]
    fn test_empty_smile_rejected() {
        let nodes: Vec<(i32, SabrNode)> = Vec::new();
        assert_eq!(
            TenorSmile::new(24, nodes).unwrap_err(),
            SwaptionError::EmptySmile { tenor: 24 }
        );
    }

    #[test]
    fn test_normal_vol_uses_structure() {
        let cube = cube();
        let vol = cube.normal_vol(12.0, 12, 0.015, 0.015, 1.0).unwrap();
        let params = SABRParams::new(0.01, 0.2, -0.1, 0.5, 0.25).unwrap();
        let direct = SABRModel::new(params, 0.015, 1.0).unwrap().atm_vol().unwrap();
        assert_eq!(vol, direct);
        assert_eq!(cube.tenors(), vec![12, 120]);
    }
}
