//! Market model: named curves plus named volatility cubes.

use std::collections::BTreeMap;
use std::sync::Arc;

use pricer_core::market_data::{CurveEnum, CurveSet};

use super::cube::SabrVolatilityCube;
use super::error::SwaptionError;

/// Curves and calibrated cubes resolved by name.
///
/// Cubes are shared behind `Arc`, so deriving a market with an extra cube
/// does not copy the existing ones.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::{CurveEnum, CurveSet};
/// use pricer_models::swaptions::SwaptionMarket;
///
/// let market = SwaptionMarket::new(
///     CurveSet::new()
///         .with_curve("discount", CurveEnum::flat(0.01))
///         .with_curve("forward", CurveEnum::flat(0.015)),
/// );
///
/// assert!(market.curve("discount").is_ok());
/// assert!(market.volatility_cube("EUR").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SwaptionMarket {
    curves: CurveSet<f64>,
    cubes: BTreeMap<String, Arc<SabrVolatilityCube>>,
}

impl SwaptionMarket {
    /// Market without cubes.
    pub fn new(curves: CurveSet<f64>) -> Self {
        Self {
            curves,
            cubes: BTreeMap::new(),
        }
    }

    /// All curves.
    pub fn curves(&self) -> &CurveSet<f64> {
        &self.curves
    }

    /// Curve by name; `CurveNotFound` when absent.
    pub fn curve(&self, name: &str) -> Result<&CurveEnum<f64>, SwaptionError> {
        Ok(self.curves.get_or_err(name)?)
    }

    /// New market with an additional or replaced cube.
    pub fn with_volatility_cube(&self, cube: SabrVolatilityCube) -> Self {
        let mut market = self.clone();
        market
            .cubes
            .insert(cube.name().to_string(), Arc::new(cube));
        market
    }

    /// Cube by name; `CubeNotFound` when absent.
    pub fn volatility_cube(&self, name: &str) -> Result<&SabrVolatilityCube, SwaptionError> {
        self.cubes
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| SwaptionError::CubeNotFound {
                name: name.to_string(),
            })
    }

    /// Names of the registered cubes.
    pub fn cube_names(&self) -> impl Iterator<Item = &str> {
        self.cubes.keys().map(String::as_str)
    }
}
