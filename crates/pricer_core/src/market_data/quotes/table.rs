//! Sparse (maturity, tenor) quote tables.

use crate::market_data::error::MarketDataError;
use std::collections::BTreeMap;
use std::fmt;

/// Unit of the integer offsets used as table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TableConvention {
    /// Offsets in months.
    Months,
    /// Offsets in years.
    Years,
}

impl fmt::Display for TableConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableConvention::Months => write!(f, "months"),
            TableConvention::Years => write!(f, "years"),
        }
    }
}

/// A single table cell.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuoteEntry {
    /// Maturity offset.
    pub maturity: i32,
    /// Tenor offset.
    pub tenor: i32,
    /// Quoted value.
    pub value: f64,
}

/// Immutable sparse table of values keyed by (maturity, tenor).
///
/// Keys are integer offsets in the table's [`TableConvention`]. A table only
/// answers queries in its own convention; [`to_convention`] produces a
/// re-keyed copy. Cells that were never supplied fail with
/// `MissingCoverage` instead of reading as zero.
///
/// [`to_convention`]: QuoteTable::to_convention
///
/// # Example
///
/// ```
/// use pricer_core::market_data::quotes::{QuoteTable, TableConvention};
///
/// let table = QuoteTable::from_entries(
///     "rho",
///     TableConvention::Years,
///     [(1, 5, -0.2), (1, 10, -0.25)],
/// )
/// .unwrap();
///
/// assert_eq!(table.value(1, 5).unwrap(), -0.2);
/// assert!(table.value(2, 5).is_err());
///
/// let months = table.to_convention(TableConvention::Months).unwrap();
/// assert_eq!(months.value(12, 120).unwrap(), -0.25);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "QuoteTableRecord", into = "QuoteTableRecord")
)]
pub struct QuoteTable {
    name: String,
    convention: TableConvention,
    values: BTreeMap<(i32, i32), f64>,
}

impl QuoteTable {
    /// Build a table from (maturity, tenor, value) triples.
    ///
    /// Fails with `DuplicateEntry` if a cell appears twice.
    pub fn from_entries<I>(
        name: impl Into<String>,
        convention: TableConvention,
        entries: I,
    ) -> Result<Self, MarketDataError>
    where
        I: IntoIterator<Item = (i32, i32, f64)>,
    {
        let name = name.into();
        let mut values = BTreeMap::new();
        for (maturity, tenor, value) in entries {
            if values.insert((maturity, tenor), value).is_some() {
                return Err(MarketDataError::DuplicateEntry {
                    table: name,
                    maturity,
                    tenor,
                });
            }
        }
        Ok(Self {
            name,
            convention,
            values,
        })
    }

    /// Build a dense table: `values[i][j]` sits at `(maturities[i], tenors[j])`.
    pub fn from_grid(
        name: impl Into<String>,
        convention: TableConvention,
        maturities: &[i32],
        tenors: &[i32],
        values: &[Vec<f64>],
    ) -> Result<Self, MarketDataError> {
        if values.len() != maturities.len() {
            return Err(MarketDataError::LengthMismatch {
                what: "table rows".to_string(),
                expected: maturities.len(),
                got: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|row| row.len() != tenors.len()) {
            return Err(MarketDataError::LengthMismatch {
                what: "table columns".to_string(),
                expected: tenors.len(),
                got: row.len(),
            });
        }

        let entries = maturities.iter().zip(values).flat_map(|(&maturity, row)| {
            tenors
                .iter()
                .zip(row)
                .map(move |(&tenor, &value)| (maturity, tenor, value))
        });
        Self::from_entries(name, convention, entries)
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit of the keys.
    pub fn convention(&self) -> TableConvention {
        self.convention
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no cell is populated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a cell, in the table's own convention.
    pub fn value(&self, maturity: i32, tenor: i32) -> Result<f64, MarketDataError> {
        self.values
            .get(&(maturity, tenor))
            .copied()
            .ok_or_else(|| MarketDataError::MissingCoverage {
                table: self.name.clone(),
                maturity,
                tenor,
            })
    }

    /// Whether a cell is populated.
    pub fn contains(&self, maturity: i32, tenor: i32) -> bool {
        self.values.contains_key(&(maturity, tenor))
    }

    /// Distinct maturities in increasing order.
    pub fn maturities(&self) -> Vec<i32> {
        let mut maturities: Vec<i32> = self.values.keys().map(|&(m, _)| m).collect();
        maturities.dedup();
        maturities
    }

    /// Tenors populated for a maturity, in increasing order.
    pub fn tenors_for_maturity(&self, maturity: i32) -> Vec<i32> {
        self.values
            .range((maturity, i32::MIN)..=(maturity, i32::MAX))
            .map(|(&(_, t), _)| t)
            .collect()
    }

    /// All cells ordered by (maturity, tenor).
    pub fn iter(&self) -> impl Iterator<Item = QuoteEntry> + '_ {
        self.values
            .iter()
            .map(|(&(maturity, tenor), &value)| QuoteEntry {
                maturity,
                tenor,
                value,
            })
    }

    /// Re-key the table in another convention.
    ///
    /// Years to months multiplies by 12; months to years requires every
    /// offset to be a whole number of years.
    pub fn to_convention(&self, target: TableConvention) -> Result<QuoteTable, MarketDataError> {
        let rekey = |offset: i32| -> Result<i32, MarketDataError> {
            match (self.convention, target) {
                (TableConvention::Months, TableConvention::Months)
                | (TableConvention::Years, TableConvention::Years) => Ok(offset),
                (TableConvention::Years, TableConvention::Months) => offset
                    .checked_mul(12)
                    .ok_or(MarketDataError::IncompatibleOffset { months: offset }),
                (TableConvention::Months, TableConvention::Years) => {
                    if offset % 12 == 0 {
                        Ok(offset / 12)
                    } else {
                        Err(MarketDataError::IncompatibleOffset { months: offset })
                    }
                }
            }
        };

        let values = self
            .values
            .iter()
            .map(|(&(m, t), &v)| Ok(((rekey(m)?, rekey(t)?), v)))
            .collect::<Result<BTreeMap<_, _>, MarketDataError>>()?;

        Ok(QuoteTable {
            name: self.name.clone(),
            convention: target,
            values,
        })
    }
}

/// Flat serialised form of a [`QuoteTable`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct QuoteTableRecord {
    name: String,
    convention: TableConvention,
    entries: Vec<QuoteEntry>,
}

#[cfg(feature = "serde")]
impl TryFrom<QuoteTableRecord> for QuoteTable {
    type Error = MarketDataError;

    fn try_from(record: QuoteTableRecord) -> Result<Self, Self::Error> {
        QuoteTable::from_entries(
            record.name,
            record.convention,
            record.entries.into_iter().map(|e| (e.maturity, e.tenor, e.value)),
        )
    }
}

#[cfg(feature = "serde")]
impl From<QuoteTable> for QuoteTableRecord {
    fn from(table: QuoteTable) -> Self {
        QuoteTableRecord {
            entries: table.iter().collect(),
            name: table.name,
            convention: table.convention,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuoteTable {
        QuoteTable::from_grid(
            "vols",
            TableConvention::Months,
            &[12, 24],
            &[12, 60, 120],
            &[vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = QuoteTable::from_entries(
            "dup",
            TableConvention::Months,
            [(12, 60, 1.0), (12, 60, 2.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            MarketDataError::DuplicateEntry {
                table: "dup".to_string(),
                maturity: 12,
                tenor: 60
            }
        );
    }

    #[test]
    fn test_grid_shape_checked() {
        let err = QuoteTable::from_grid(
            "bad",
            TableConvention::Months,
            &[12],
            &[12, 24],
            &[vec![0.1]],
        )
        .unwrap_err();
        assert!(matches!(err, MarketDataError::LengthMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_missing_cell_is_error_not_zero() {
        let table = QuoteTable::from_entries("sparse", TableConvention::Months, [(12, 60, 0.0)])
            .unwrap();
        assert_eq!(table.value(12, 60).unwrap(), 0.0);
        assert!(matches!(
            table.value(12, 120),
            Err(MarketDataError::MissingCoverage { maturity: 12, tenor: 120, .. })
        ));
    }

    #[test]
    fn test_axes() {
        let table = sample();
        assert_eq!(table.maturities(), vec![12, 24]);
        assert_eq!(table.tenors_for_maturity(24), vec![12, 60, 120]);
        assert!(table.tenors_for_maturity(36).is_empty());
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_months_to_years_and_back() {
        let table = sample();
        let years = table.to_convention(TableConvention::Years).unwrap();
        assert_eq!(years.convention(), TableConvention::Years);
        assert_eq!(years.value(2, 10).unwrap(), 0.6);
        assert_eq!(years.to_convention(TableConvention::Months).unwrap(), table);
    }

    #[test]
    fn test_fractional_years_rejected() {
        let table =
            QuoteTable::from_entries("odd", TableConvention::Months, [(18, 60, 1.0)]).unwrap();
        assert_eq!(
            table.to_convention(TableConvention::Years).unwrap_err(),
            MarketDataError::IncompatibleOffset { months: 18 }
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_record_rejects_duplicates() {
        let record = QuoteTableRecord {
            name: "x".to_string(),
            convention: TableConvention::Months,
            entries: vec![
                QuoteEntry {
                    maturity: 1,
                    tenor: 1,
                    value: 0.0,
                },
                QuoteEntry {
                    maturity: 1,
                    tenor: 1,
                    value: 1.0,
                },
            ],
        };
        assert!(QuoteTable::try_from(record).is_err());
        let round_trip = QuoteTable::try_from(QuoteTableRecord::from(sample())).unwrap();
        assert_eq!(round_trip, sample());
    }
}
