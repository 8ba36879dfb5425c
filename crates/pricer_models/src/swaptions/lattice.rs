//! Swaption quote lattice keyed by (maturity, tenor, moneyness).
//!
//! A lattice holds every quote of one quoting convention and settlement
//! type, together with the curve names and leg templates needed to turn a
//! coordinate into a priced swaption. Entries are frozen in
//! (moneyness, maturity, tenor) order; every transform returns a new lattice.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use pricer_core::market_data::{QuoteTable, TableConvention};
use pricer_core::types::time::Date;

use super::error::SwaptionError;
use super::SwaptionType;
use crate::schedules::SchedulePrototype;

/// Quantity a quote expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    /// Option premium measured at expiry.
    Price,
    /// Bachelier volatility.
    NormalVol,
    /// Displaced Black volatility.
    LognormalVol,
}

/// How the values of a lattice are quoted.
///
/// Receiver conventions are stored at their own moneyness: a receiver at
/// `+m` is struck `m` bp below par.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotingConvention {
    /// Payer swaption premium.
    PayerPrice,
    /// Receiver swaption premium.
    ReceiverPrice,
    /// Payer normal volatility.
    PayerVolNormal,
    /// Receiver normal volatility.
    ReceiverVolNormal,
    /// Payer displaced lognormal volatility.
    PayerVolLognormal,
    /// Receiver displaced lognormal volatility.
    ReceiverVolLognormal,
}

impl QuotingConvention {
    /// Builds a convention from its side and quantity.
    pub fn from_parts(side: SwaptionType, kind: QuoteKind) -> Self {
        match (side, kind) {
            (SwaptionType::Payer, QuoteKind::Price) => QuotingConvention::PayerPrice,
            (SwaptionType::Receiver, QuoteKind::Price) => QuotingConvention::ReceiverPrice,
            (SwaptionType::Payer, QuoteKind::NormalVol) => QuotingConvention::PayerVolNormal,
            (SwaptionType::Receiver, QuoteKind::NormalVol) => QuotingConvention::ReceiverVolNormal,
            (SwaptionType::Payer, QuoteKind::LognormalVol) => QuotingConvention::PayerVolLognormal,
            (SwaptionType::Receiver, QuoteKind::LognormalVol) => {
                QuotingConvention::ReceiverVolLognormal
            }
        }
    }

    /// Payer or receiver.
    pub fn side(&self) -> SwaptionType {
        match self {
            QuotingConvention::PayerPrice
            | QuotingConvention::PayerVolNormal
            | QuotingConvention::PayerVolLognormal => SwaptionType::Payer,
            QuotingConvention::ReceiverPrice
            | QuotingConvention::ReceiverVolNormal
            | QuotingConvention::ReceiverVolLognormal => SwaptionType::Receiver,
        }
    }

    /// Quoted quantity.
    pub fn kind(&self) -> QuoteKind {
        match self {
            QuotingConvention::PayerPrice | QuotingConvention::ReceiverPrice => QuoteKind::Price,
            QuotingConvention::PayerVolNormal | QuotingConvention::ReceiverVolNormal => {
                QuoteKind::NormalVol
            }
            QuotingConvention::PayerVolLognormal | QuotingConvention::ReceiverVolLognormal => {
                QuoteKind::LognormalVol
            }
        }
    }

    /// Upper snake case name, e.g. `PAYER_VOL_NORMAL`.
    pub fn name(&self) -> &'static str {
        match self {
            QuotingConvention::PayerPrice => "PAYER_PRICE",
            QuotingConvention::ReceiverPrice => "RECEIVER_PRICE",
            QuotingConvention::PayerVolNormal => "PAYER_VOL_NORMAL",
            QuotingConvention::ReceiverVolNormal => "RECEIVER_VOL_NORMAL",
            QuotingConvention::PayerVolLognormal => "PAYER_VOL_LOGNORMAL",
            QuotingConvention::ReceiverVolLognormal => "RECEIVER_VOL_LOGNORMAL",
        }
    }
}

impl fmt::Display for QuotingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for QuotingConvention {
    type Err = String;

    /// Case-insensitive; `-` and spaces are read as `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace(['-', ' '], "_").as_str() {
            "PAYER_PRICE" => Ok(QuotingConvention::PayerPrice),
            "RECEIVER_PRICE" => Ok(QuotingConvention::ReceiverPrice),
            "PAYER_VOL_NORMAL" => Ok(QuotingConvention::PayerVolNormal),
            "RECEIVER_VOL_NORMAL" => Ok(QuotingConvention::ReceiverVolNormal),
            "PAYER_VOL_LOGNORMAL" => Ok(QuotingConvention::PayerVolLognormal),
            "RECEIVER_VOL_LOGNORMAL" => Ok(QuotingConvention::ReceiverVolLognormal),
            _ => Err(format!("Unknown quoting convention: {}", s)),
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::QuotingConvention;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for QuotingConvention {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.name())
        }
    }

    impl<'de> Deserialize<'de> for QuotingConvention {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        }
    }
}

/// Settlement of the quoted swaptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Settlement {
    /// Settled against the cash annuity of the swap rate.
    Cash,
    /// Settled by entering the swap.
    Physical,
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Settlement::Cash => write!(f, "cash"),
            Settlement::Physical => write!(f, "physical"),
        }
    }
}

/// Lattice metadata shared by all entries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeMeta {
    /// Valuation date; maturities are offsets from it.
    pub reference_date: Date,
    /// Quoting convention of every value.
    pub convention: QuotingConvention,
    /// Settlement type.
    pub settlement: Settlement,
    /// Rate displacement for lognormal quotes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub displacement: f64,
    /// Name of the discounting curve.
    pub discount_curve: String,
    /// Name of the projection curve.
    pub forward_curve: String,
    /// Fixed-leg template.
    pub fixed_leg: SchedulePrototype,
    /// Floating-leg template.
    pub floating_leg: SchedulePrototype,
}

impl LatticeMeta {
    /// Copy with another quoting convention.
    pub fn with_convention(mut self, convention: QuotingConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Copy with another settlement type.
    pub fn with_settlement(mut self, settlement: Settlement) -> Self {
        self.settlement = settlement;
        self
    }
}

/// Lattice coordinate. Orders by moneyness, then maturity, then tenor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LatticeKey {
    /// Strike offset from par in basis points.
    pub moneyness: i32,
    /// Months from the reference date to expiry.
    pub maturity: i32,
    /// Swap length in months.
    pub tenor: i32,
}

impl LatticeKey {
    /// Creates a key from (maturity, tenor, moneyness).
    pub fn new(maturity: i32, tenor: i32, moneyness: i32) -> Self {
        Self {
            moneyness,
            maturity,
            tenor,
        }
    }
}

/// One lattice entry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticePoint {
    /// Months to expiry.
    pub maturity: i32,
    /// Swap length in months.
    pub tenor: i32,
    /// Strike offset from par in basis points.
    pub moneyness: i32,
    /// Quoted value.
    pub value: f64,
}

/// Immutable swaption quote lattice.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::{Date, DayCountConvention};
/// use pricer_models::schedules::{Frequency, SchedulePrototype};
/// use pricer_models::swaptions::{LatticeMeta, QuotingConvention, Settlement, SwaptionLattice};
///
/// let meta = LatticeMeta {
///     reference_date: Date::from_ymd(2017, 8, 30).unwrap(),
///     convention: QuotingConvention::PayerVolNormal,
///     settlement: Settlement::Physical,
///     displacement: 0.0,
///     discount_curve: "EUR-OIS".into(),
///     forward_curve: "EUR-6M".into(),
///     fixed_leg: SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360),
///     floating_leg: SchedulePrototype::new(
///         Frequency::SemiAnnual,
///         DayCountConvention::ActualActual360,
///     ),
/// };
///
/// let lattice = SwaptionLattice::from_arrays(
///     meta,
///     &[12, 12, 24],
///     &[60, 60, 60],
///     &[0, 50, 0],
///     &[0.0052, 0.0055, 0.0058],
/// )
/// .unwrap();
///
/// assert_eq!(lattice.len(), 3);
/// assert_eq!(lattice.value(12, 60, 50).unwrap(), 0.0055);
/// assert!(lattice.value(24, 60, 50).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "LatticeRecord", into = "LatticeRecord")
)]
pub struct SwaptionLattice {
    meta: LatticeMeta,
    keys: Vec<LatticeKey>,
    values: Vec<f64>,
}

impl SwaptionLattice {
    /// Builds a lattice from parallel arrays.
    pub fn from_arrays(
        meta: LatticeMeta,
        maturities: &[i32],
        tenors: &[i32],
        moneyness: &[i32],
        values: &[f64],
    ) -> Result<Self, SwaptionError> {
        let n = maturities.len();
        for (what, got) in [
            ("tenors", tenors.len()),
            ("moneyness", moneyness.len()),
            ("values", values.len()),
        ] {
            if got != n {
                return Err(SwaptionError::LengthMismatch {
                    what,
                    expected: n,
                    got,
                });
            }
        }

        let mut builder = SwaptionLatticeBuilder::new(meta);
        for i in 0..n {
            builder.insert(maturities[i], tenors[i], moneyness[i], values[i])?;
        }
        Ok(builder.build())
    }

    /// Builds a lattice from points.
    pub fn from_points<I>(meta: LatticeMeta, points: I) -> Result<Self, SwaptionError>
    where
        I: IntoIterator<Item = LatticePoint>,
    {
        let mut builder = SwaptionLatticeBuilder::new(meta);
        for p in points {
            builder.insert(p.maturity, p.tenor, p.moneyness, p.value)?;
        }
        Ok(builder.build())
    }

    /// Starts an empty builder.
    pub fn builder(meta: LatticeMeta) -> SwaptionLatticeBuilder {
        SwaptionLatticeBuilder::new(meta)
    }

    /// Lattice metadata.
    pub fn meta(&self) -> &LatticeMeta {
        &self.meta
    }

    /// Quoting convention.
    pub fn convention(&self) -> QuotingConvention {
        self.meta.convention
    }

    /// Settlement type.
    pub fn settlement(&self) -> Settlement {
        self.meta.settlement
    }

    /// Valuation date.
    pub fn reference_date(&self) -> Date {
        self.meta.reference_date
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the lattice holds no entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Value at a coordinate, if present.
    pub fn get(&self, maturity: i32, tenor: i32, moneyness: i32) -> Option<f64> {
        self.keys
            .binary_search(&LatticeKey::new(maturity, tenor, moneyness))
            .ok()
            .map(|i| self.values[i])
    }

    /// Value at a coordinate; `MissingCoverage` when absent.
    pub fn value(&self, maturity: i32, tenor: i32, moneyness: i32) -> Result<f64, SwaptionError> {
        self.get(maturity, tenor, moneyness)
            .ok_or(SwaptionError::MissingCoverage {
                maturity,
                tenor,
                moneyness,
            })
    }

    /// True when the coordinate is populated.
    pub fn contains(&self, maturity: i32, tenor: i32, moneyness: i32) -> bool {
        self.get(maturity, tenor, moneyness).is_some()
    }

    /// Entries in (moneyness, maturity, tenor) order.
    pub fn iter(&self) -> impl Iterator<Item = LatticePoint> + '_ {
        self.keys
            .iter()
            .zip(&self.values)
            .map(|(k, &value)| LatticePoint {
                maturity: k.maturity,
                tenor: k.tenor,
                moneyness: k.moneyness,
                value,
            })
    }

    /// Entries for one tenor.
    pub fn tenor_slice(&self, tenor: i32) -> impl Iterator<Item = LatticePoint> + '_ {
        self.iter().filter(move |p| p.tenor == tenor)
    }

    /// Distinct maturities, ascending.
    pub fn maturities(&self) -> Vec<i32> {
        distinct(self.keys.iter().map(|k| k.maturity))
    }

    /// Distinct tenors, ascending.
    pub fn tenors(&self) -> Vec<i32> {
        distinct(self.keys.iter().map(|k| k.tenor))
    }

    /// Distinct moneyness levels, ascending.
    pub fn moneyness_levels(&self) -> Vec<i32> {
        distinct(self.keys.iter().map(|k| k.moneyness))
    }

    /// Splits the lattice into one months-convention table per moneyness.
    pub fn to_tables(&self) -> Result<BTreeMap<i32, QuoteTable>, SwaptionError> {
        let mut grouped: BTreeMap<i32, Vec<(i32, i32, f64)>> = BTreeMap::new();
        for p in self.iter() {
            grouped
                .entry(p.moneyness)
                .or_default()
                .push((p.maturity, p.tenor, p.value));
        }
        grouped
            .into_iter()
            .map(|(m, cells)| -> Result<(i32, QuoteTable), SwaptionError> {
                let table =
                    QuoteTable::from_entries(format!("{}bp", m), TableConvention::Months, cells)?;
                Ok((m, table))
            })
            .collect()
    }

    /// Union of two lattices sharing convention and settlement.
    ///
    /// Metadata is taken from `self`; overlapping coordinates fail with
    /// `DuplicateEntry`.
    pub fn merge(&self, other: &SwaptionLattice) -> Result<SwaptionLattice, SwaptionError> {
        if other.convention() != self.convention() || other.settlement() != self.settlement() {
            return Err(SwaptionError::InvalidConvention {
                expected: format!("{} {}", self.settlement(), self.convention()),
                found: format!("{} {}", other.settlement(), other.convention()),
            });
        }
        let mut builder = self.to_builder();
        for p in other.iter() {
            builder.insert(p.maturity, p.tenor, p.moneyness, p.value)?;
        }
        Ok(builder.build())
    }

    /// Builder seeded with this lattice's metadata and entries.
    pub fn to_builder(&self) -> SwaptionLatticeBuilder {
        SwaptionLatticeBuilder {
            meta: self.meta.clone(),
            entries: self.keys.iter().copied().zip(self.values.iter().copied()).collect(),
        }
    }
}

fn distinct(values: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut out: Vec<i32> = values.collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Accumulates lattice entries before freezing them.
#[derive(Debug, Clone)]
pub struct SwaptionLatticeBuilder {
    meta: LatticeMeta,
    entries: BTreeMap<LatticeKey, f64>,
}

impl SwaptionLatticeBuilder {
    /// Empty builder.
    pub fn new(meta: LatticeMeta) -> Self {
        Self {
            meta,
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry; an occupied coordinate fails with `DuplicateEntry`.
    pub fn insert(
        &mut self,
        maturity: i32,
        tenor: i32,
        moneyness: i32,
        value: f64,
    ) -> Result<(), SwaptionError> {
        let key = LatticeKey::new(maturity, tenor, moneyness);
        if self.entries.contains_key(&key) {
            return Err(SwaptionError::DuplicateEntry {
                maturity,
                tenor,
                moneyness,
            });
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Chaining form of [`insert`](Self::insert).
    pub fn with_entry(
        mut self,
        maturity: i32,
        tenor: i32,
        moneyness: i32,
        value: f64,
    ) -> Result<Self, SwaptionError> {
        self.insert(maturity, tenor, moneyness, value)?;
        Ok(self)
    }

    /// True when the coordinate is already taken.
    pub fn contains(&self, maturity: i32, tenor: i32, moneyness: i32) -> bool {
        self.entries
            .contains_key(&LatticeKey::new(maturity, tenor, moneyness))
    }

    /// Number of accumulated entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freezes the entries into columnar, ordered storage.
    pub fn build(self) -> SwaptionLattice {
        let (keys, values) = self.entries.into_iter().unzip();
        SwaptionLattice {
            meta: self.meta,
            keys,
            values,
        }
    }
}

/// Flattens one months-convention table per moneyness into a lattice.
///
/// Any table in another convention fails with `InvalidConvention`.
pub fn lattice_from_tables(
    tables: &BTreeMap<i32, QuoteTable>,
    meta: LatticeMeta,
) -> Result<SwaptionLattice, SwaptionError> {
    let mut maturities = Vec::new();
    let mut tenors = Vec::new();
    let mut moneyness = Vec::new();
    let mut values = Vec::new();

    for (&m, table) in tables {
        if table.convention() != TableConvention::Months {
            return Err(SwaptionError::InvalidConvention {
                expected: TableConvention::Months.to_string(),
                found: table.convention().to_string(),
            });
        }
        for entry in table.iter() {
            moneyness.push(m);
            maturities.push(entry.maturity);
            tenors.push(entry.tenor);
            values.push(entry.value);
        }
    }

    SwaptionLattice::from_arrays(meta, &maturities, &tenors, &moneyness, &values)
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct LatticeRecord {
    #[serde(flatten)]
    meta: LatticeMeta,
    entries: Vec<LatticePoint>,
}

#[cfg(feature = "serde")]
impl TryFrom<LatticeRecord> for SwaptionLattice {
    type Error = SwaptionError;

    fn try_from(record: LatticeRecord) -> Result<Self, Self::Error> {
        SwaptionLattice::from_points(record.meta, record.entries)
    }
}

#[cfg(feature = "serde")]
impl From<SwaptionLattice> for LatticeRecord {
    fn from(lattice: SwaptionLattice) -> Self {
        let entries = lattice.iter().collect();
        LatticeRecord {
            meta: lattice.meta,
            entries,
        }
    }
}
