//! Analytical option formulas used for swaption quoting.
//!
//! - Bachelier (normal) model with implied normal volatility
//! - Displaced Black (shifted lognormal) model with implied volatility
//! - Standard normal distribution functions

pub mod bachelier;
pub mod black;
pub mod distributions;
pub mod error;

pub use bachelier::{bachelier_implied_vol, bachelier_price, Bachelier};
pub use black::{black_implied_vol, black_price, DisplacedBlack};
pub use distributions::{norm_cdf, norm_pdf};
pub use error::AnalyticalError;

/// Call or put on the underlying rate.
///
/// A payer swaption is a call on the swap rate, a receiver swaption a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionType {
    /// Pays `(S - K)^+`.
    Call,
    /// Pays `(K - S)^+`.
    Put,
}
