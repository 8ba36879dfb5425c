//! Volatility models.
//!
//! - [`sabr`]: displaced SABR with Hagan's normal-volatility expansion, the
//!   smile model behind the swaption cube.

pub mod sabr;

pub use sabr::{sabr_normal_vol, SABRError, SABRModel, SABRParams, DISPLACED_STRIKE_FLOOR};
