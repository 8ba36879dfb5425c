//! Swaption quotes, conventions and cash-settlement pricing.
//!
//! - [`lattice`]: quotes keyed by (maturity, tenor, moneyness) with their
//!   quoting convention and settlement
//! - [`conversion`]: convention changes through payer normal volatility and
//!   the cash-to-physical smile shift
//! - [`cube`]: SABR parameters per tenor, interpolated in expiry
//! - [`annuity`], [`replication`]: cash-settled swaptions by static
//!   replication against an annuity mapping
//!
//! Moneyness is in basis points from the par swap rate; maturity and tenor
//! are in months.

pub mod annuity;
pub mod conversion;
pub mod cube;
pub mod error;
pub mod lattice;
pub mod market;
pub mod replication;
pub mod swap;

use std::fmt;

pub use annuity::{AnnuityMapping, AnnuityMappingType};
pub use conversion::{cash_prices_to_normal_vols, shift_cash_to_physical_smile};
pub use cube::{SabrNode, SabrStructure, SabrVolatilityCube, TenorSmile};
pub use error::SwaptionError;
pub use lattice::{
    lattice_from_tables, LatticeKey, LatticeMeta, LatticePoint, QuoteKind, QuotingConvention,
    Settlement, SwaptionLattice, SwaptionLatticeBuilder,
};
pub use market::SwaptionMarket;
pub use replication::{
    CashSettledSwaption, IntegrationScheme, PhysicalSwaption, ReplicationGrid, ReplicationRange,
    ReplicationSettings,
};
pub use swap::{cash_annuity, FixedCashflow, FloatingCashflow, ForwardSwap, SwaptionTerms};

use crate::analytical::OptionType;

/// Right to pay or to receive the fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SwaptionType {
    /// Pay fixed: a call on the swap rate.
    Payer,
    /// Receive fixed: a put on the swap rate.
    Receiver,
}

impl SwaptionType {
    /// Equivalent option on the swap rate.
    #[inline]
    pub fn option_type(&self) -> OptionType {
        match self {
            SwaptionType::Payer => OptionType::Call,
            SwaptionType::Receiver => OptionType::Put,
        }
    }

    /// Strike `moneyness` basis points out of the money from `par`.
    ///
    /// ```
    /// use pricer_models::swaptions::SwaptionType;
    ///
    /// assert!((SwaptionType::Payer.strike(0.02, 50) - 0.025).abs() < 1e-15);
    /// assert!((SwaptionType::Receiver.strike(0.02, 50) - 0.015).abs() < 1e-15);
    /// ```
    pub fn strike(&self, par: f64, moneyness: i32) -> f64 {
        let offset = 1e-4 * moneyness as f64;
        match self {
            SwaptionType::Payer => par + offset,
            SwaptionType::Receiver => par - offset,
        }
    }
}

impl fmt::Display for SwaptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwaptionType::Payer => write!(f, "payer"),
            SwaptionType::Receiver => write!(f, "receiver"),
        }
    }
}
