//! Named yield curves.

use super::CurveEnum;
use crate::market_data::error::MarketDataError;
use num_traits::Float;
use std::collections::BTreeMap;

/// Yield curves registered under string names.
///
/// Swaption quotes refer to their discounting and projection curves by name,
/// so lookups fail with `CurveNotFound` rather than falling back.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{CurveEnum, CurveSet, YieldCurve};
///
/// let curves = CurveSet::new()
///     .with_curve("EUR-OIS", CurveEnum::flat(0.01))
///     .with_curve("EUR-6M", CurveEnum::flat(0.015));
///
/// let df = curves.get_or_err("EUR-OIS").unwrap().discount_factor(1.0).unwrap();
/// assert!(df < 1.0);
/// assert!(curves.get_or_err("USD-OIS").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CurveSet<T: Float> {
    curves: BTreeMap<String, CurveEnum<T>>,
}

impl<T: Float> Default for CurveSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> CurveSet<T> {
    /// Empty set.
    pub fn new() -> Self {
        Self {
            curves: BTreeMap::new(),
        }
    }

    /// Builder form of [`insert`](CurveSet::insert).
    pub fn with_curve(mut self, name: impl Into<String>, curve: CurveEnum<T>) -> Self {
        self.insert(name, curve);
        self
    }

    /// Register a curve, replacing any previous curve of that name.
    pub fn insert(&mut self, name: impl Into<String>, curve: CurveEnum<T>) -> Option<CurveEnum<T>> {
        self.curves.insert(name.into(), curve)
    }

    /// Look up a curve.
    pub fn get(&self, name: &str) -> Option<&CurveEnum<T>> {
        self.curves.get(name)
    }

    /// Look up a curve, failing with `CurveNotFound`.
    pub fn get_or_err(&self, name: &str) -> Result<&CurveEnum<T>, MarketDataError> {
        self.curves
            .get(name)
            .ok_or_else(|| MarketDataError::CurveNotFound {
                name: name.to_string(),
            })
    }

    /// Whether a curve of that name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// True when no curves are registered.
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Curve names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }
}
