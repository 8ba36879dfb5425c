//! Displaced SABR model with Hagan's normal-volatility expansion.
//!
//! The forward follows displaced CEV dynamics
//!
//! ```text
//! dF = σ (F + d)^β dW₁,    dσ = ν σ dW₂,    dW₁·dW₂ = ρ dt
//! ```
//!
//! and quotes are produced as Bachelier (normal) volatilities, the native
//! unit of the swaption cube. The displacement `d` keeps the model defined
//! for negative rates down to `-d`.
//!
//! ## Example
//!
//! ```
//! use pricer_models::models::sabr::{SABRModel, SABRParams};
//!
//! let params = SABRParams::new(0.01, 0.3, -0.2, 0.5, 0.25).unwrap();
//! let model = SABRModel::new(params, 0.015, 2.0).unwrap();
//!
//! let atm = model.normal_vol(0.015).unwrap();
//! let wing = model.normal_vol(0.035).unwrap();
//! assert!(atm > 0.0 && wing > 0.0);
//! ```

use thiserror::Error;

/// Smallest displaced strike the expansion is evaluated at.
pub const DISPLACED_STRIKE_FLOOR: f64 = 1e-7;

/// Below this |ζ| the ratio ζ/x(ζ) is taken from its Taylor series.
const ZETA_SERIES_THRESHOLD: f64 = 1e-6;

/// Relative forward/strike gap treated as at-the-money.
const ATM_RELATIVE_GAP: f64 = 1e-10;

/// SABR model errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SABRError {
    /// Base volatility must be positive.
    #[error("Invalid base volatility: alpha = {0} (must be positive)")]
    InvalidAlpha(f64),

    /// Vol-of-vol must be non-negative.
    #[error("Invalid vol-of-vol: nu = {0} (must be non-negative)")]
    InvalidNu(f64),

    /// Beta must lie in [0, 1].
    #[error("Invalid beta: beta = {0} (must be in [0, 1])")]
    InvalidBeta(f64),

    /// Correlation must lie in (-1, 1).
    #[error("Invalid correlation: rho = {0} (must be in (-1, 1))")]
    InvalidRho(f64),

    /// Displacement must be non-negative.
    #[error("Invalid displacement: d = {0} (must be non-negative)")]
    InvalidDisplacement(f64),

    /// Displaced forward must be positive.
    #[error("Invalid forward: F = {forward} with displacement {displacement}")]
    InvalidForward {
        /// Undisplaced forward rate
        forward: f64,
        /// Displacement applied
        displacement: f64,
    },

    /// Expiry must be non-negative.
    #[error("Invalid expiry: T = {0} (must be non-negative)")]
    InvalidExpiry(f64),

    /// The expansion produced NaN or infinity.
    #[error("Non-finite normal volatility at strike {0}")]
    NonFinite(f64),
}

/// SABR parameters for a single smile.
///
/// `beta` and `displacement` are structural and shared across the cube;
/// `alpha`, `nu` and `rho` are calibrated per expiry and tenor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SABRParams {
    /// Base volatility (alpha)
    pub alpha: f64,
    /// Volatility of volatility (nu)
    pub nu: f64,
    /// Correlation between forward and volatility (rho)
    pub rho: f64,
    /// CEV exponent (beta): 0 = normal, 1 = lognormal
    pub beta: f64,
    /// Rate displacement
    pub displacement: f64,
}

impl SABRParams {
    /// Creates validated SABR parameters.
    ///
    /// ```
    /// use pricer_models::models::sabr::SABRParams;
    ///
    /// assert!(SABRParams::new(0.01, 0.3, -0.2, 0.5, 0.25).is_ok());
    /// assert!(SABRParams::new(-0.01, 0.3, -0.2, 0.5, 0.25).is_err());
    /// ```
    pub fn new(
        alpha: f64,
        nu: f64,
        rho: f64,
        beta: f64,
        displacement: f64,
    ) -> Result<Self, SABRError> {
        let params = Self {
            alpha,
            nu,
            rho,
            beta,
            displacement,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks parameter domains.
    pub fn validate(&self) -> Result<(), SABRError> {
        if !(self.alpha > 0.0) || !self.alpha.is_finite() {
            return Err(SABRError::InvalidAlpha(self.alpha));
        }
        if !(self.nu >= 0.0) || !self.nu.is_finite() {
            return Err(SABRError::InvalidNu(self.nu));
        }
        if !(0.0..=1.0).contains(&self.beta) {
            return Err(SABRError::InvalidBeta(self.beta));
        }
        if !(self.rho > -1.0 && self.rho < 1.0) {
            return Err(SABRError::InvalidRho(self.rho));
        }
        if !(self.displacement >= 0.0) || !self.displacement.is_finite() {
            return Err(SABRError::InvalidDisplacement(self.displacement));
        }
        Ok(())
    }

    /// True when beta is (numerically) zero.
    pub fn is_normal(&self) -> bool {
        self.beta.abs() < 1e-12
    }

    /// True when beta is (numerically) one.
    pub fn is_lognormal(&self) -> bool {
        (self.beta - 1.0).abs() < 1e-12
    }
}

/// SABR smile at a fixed forward and expiry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SABRModel {
    params: SABRParams,
    forward: f64,
    expiry: f64,
}

impl SABRModel {
    /// Binds parameters to a forward and an expiry in years.
    ///
    /// Fails when the displaced forward `F + d` is not positive.
    pub fn new(params: SABRParams, forward: f64, expiry: f64) -> Result<Self, SABRError> {
        params.validate()?;
        if !(forward + params.displacement > 0.0) {
            return Err(SABRError::InvalidForward {
                forward,
                displacement: params.displacement,
            });
        }
        if !(expiry >= 0.0) {
            return Err(SABRError::InvalidExpiry(expiry));
        }
        Ok(Self {
            params,
            forward,
            expiry,
        })
    }

    /// Model parameters.
    pub fn params(&self) -> &SABRParams {
        &self.params
    }

    /// Undisplaced forward.
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Expiry in years.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// At-the-money normal volatility.
    pub fn atm_vol(&self) -> Result<f64, SABRError> {
        self.normal_vol(self.forward)
    }

    /// Normal (Bachelier) implied volatility at `strike`.
    ///
    /// Strikes below `-d` are floored at [`DISPLACED_STRIKE_FLOOR`] in
    /// displaced space.
    pub fn normal_vol(&self, strike: f64) -> Result<f64, SABRError> {
        let vol = hagan_normal_vol(&self.params, self.forward, strike, self.expiry);
        if vol.is_finite() {
            Ok(vol.max(0.0))
        } else {
            Err(SABRError::NonFinite(strike))
        }
    }
}

/// Convenience wrapper for a one-off evaluation.
///
/// ```
/// use pricer_models::models::sabr::{sabr_normal_vol, SABRParams};
///
/// // beta = 0 and nu = 0 reduce SABR to a flat Bachelier smile at alpha.
/// let params = SABRParams::new(0.008, 0.0, 0.0, 0.0, 0.0).unwrap();
/// let vol = sabr_normal_vol(&params, 0.02, 0.05, 5.0).unwrap();
/// assert!((vol - 0.008).abs() < 1e-14);
/// ```
pub fn sabr_normal_vol(
    params: &SABRParams,
    forward: f64,
    strike: f64,
    expiry: f64,
) -> Result<f64, SABRError> {
    SABRModel::new(*params, forward, expiry)?.normal_vol(strike)
}

fn hagan_normal_vol(params: &SABRParams, forward: f64, strike: f64, expiry: f64) -> f64 {
    let SABRParams {
        alpha,
        nu,
        rho,
        beta,
        displacement,
    } = *params;

    let f = forward + displacement;
    let k = (strike + displacement).max(DISPLACED_STRIKE_FLOOR);
    let one_minus_beta = 1.0 - beta;
    let f_mid = (f * k).sqrt();
    let gap = f - k;

    // (F - K) / ∫_K^F x^-β dx written with L = ln(F/K) so that
    // F^a - K^a = 2 F_m^a sinh(aL/2) carries no cancellation near the money.
    let half_log = 0.5 * (f / k).ln();
    let shape = if half_log.abs() < ATM_RELATIVE_GAP {
        1.0
    } else if params.is_lognormal() {
        half_log.sinh() / half_log
    } else {
        one_minus_beta * half_log.sinh() / (one_minus_beta * half_log).sinh()
    };
    let cev_ratio = f_mid.powf(beta) * shape;

    let zeta = nu / alpha * gap / f_mid.powf(beta);
    let zeta_ratio = zeta_over_x(zeta, rho);

    let f_pow = f_mid.powf(one_minus_beta);
    let correction = 1.0
        + expiry
            * (-beta * (2.0 - beta) * alpha * alpha / (24.0 * f_pow * f_pow)
                + rho * alpha * nu * beta / (4.0 * f_pow)
                + (2.0 - 3.0 * rho * rho) * nu * nu / 24.0);

    alpha * cev_ratio * zeta_ratio * correction
}

/// ζ / x(ζ) with x(ζ) = ln((√(1 - 2ρζ + ζ²) + ζ - ρ) / (1 - ρ)).
fn zeta_over_x(zeta: f64, rho: f64) -> f64 {
    if zeta.abs() < ZETA_SERIES_THRESHOLD {
        return 1.0 - 0.5 * rho * zeta + (2.0 - 3.0 * rho * rho) / 12.0 * zeta * zeta;
    }
    let x = (((1.0 - 2.0 * rho * zeta + zeta * zeta).sqrt() + zeta - rho) / (1.0 - rho)).ln();
    zeta / x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn model(alpha: f64, nu: f64, rho: f64, beta: f64, forward: f64, expiry: f64) -> SABRModel {
        let params = SABRParams::new(alpha, nu, rho, beta, 0.25).unwrap();
        SABRModel::new(params, forward, expiry).unwrap()
    }

    #[test]
    fn test_params_validation() {
        assert!(matches!(
            SABRParams::new(0.0, 0.3, 0.0, 0.5, 0.25),
            Err(SABRError::InvalidAlpha(_))
        ));
        assert!(matches!(
            SABRParams::new(0.01, -0.1, 0.0, 0.5, 0.25),
            Err(SABRError::InvalidNu(_))
        ));
        assert!(matches!(
            SABRParams::new(0.01, 0.3, 1.0, 0.5, 0.25),
            Err(SABRError::InvalidRho(_))
        ));
        assert!(matches!(
            SABRParams::new(0.01, 0.3, 0.0, 1.5, 0.25),
            Err(SABRError::InvalidBeta(_))
        ));
        assert!(matches!(
            SABRParams::new(0.01, 0.3, 0.0, 0.5, -0.1),
            Err(SABRError::InvalidDisplacement(_))
        ));
        assert!(matches!(
            SABRParams::new(f64::NAN, 0.3, 0.0, 0.5, 0.25),
            Err(SABRError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn test_model_rejects_forward_below_displacement() {
        let params = SABRParams::new(0.01, 0.3, 0.0, 0.5, 0.25).unwrap();
        assert!(matches!(
            SABRModel::new(params, -0.3, 1.0),
            Err(SABRError::InvalidForward { .. })
        ));
        assert!(SABRModel::new(params, -0.01, 1.0).is_ok());
        assert!(matches!(
            SABRModel::new(params, 0.01, -1.0),
            Err(SABRError::InvalidExpiry(_))
        ));
    }

    #[test]
    fn test_normal_sabr_without_vol_of_vol_is_flat() {
        let m = model(0.0085, 0.0, 0.3, 0.0, 0.015, 10.0);
        for strike in [-0.01, 0.0, 0.015, 0.04] {
            assert_relative_eq!(m.normal_vol(strike).unwrap(), 0.0085, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_normal_sabr_atm_correction() {
        let (alpha, nu, expiry) = (0.01, 0.4, 2.0);
        let m = model(alpha, nu, 0.0, 0.0, 0.02, expiry);
        let expected = alpha * (1.0 + expiry * 2.0 * nu * nu / 24.0);
        assert_relative_eq!(m.atm_vol().unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_lognormal_sabr_atm_matches_closed_form() {
        let (alpha, nu, rho, expiry, forward) = (0.05, 0.3, -0.4, 1.5, 0.02);
        let m = model(alpha, nu, rho, 1.0, forward, expiry);
        let displaced = forward + 0.25;
        let expected = alpha
            * displaced
            * (1.0
                + expiry
                    * (-alpha * alpha / 24.0
                        + rho * alpha * nu / 4.0
                        + (2.0 - 3.0 * rho * rho) * nu * nu / 24.0));
        assert_relative_eq!(m.atm_vol().unwrap(), expected, max_relative = 1e-13);
    }

    #[test]
    fn test_atm_is_continuous() {
        let m = model(0.02, 0.35, -0.25, 0.5, 0.015, 5.0);
        let atm = m.atm_vol().unwrap();
        for bump in [1e-9, 1e-7, 1e-5] {
            assert_relative_eq!(m.normal_vol(0.015 + bump).unwrap(), atm, max_relative = 1e-3);
            assert_relative_eq!(m.normal_vol(0.015 - bump).unwrap(), atm, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_negative_rho_skews_low_strikes_up() {
        let m = model(0.01, 0.4, -0.5, 0.0, 0.015, 1.0);
        let low = m.normal_vol(0.005).unwrap();
        let high = m.normal_vol(0.025).unwrap();
        assert!(low > high);
    }

    #[test]
    fn test_strike_below_displacement_is_floored() {
        let m = model(0.02, 0.3, 0.0, 0.5, 0.01, 1.0);
        let vol = m.normal_vol(-0.5).unwrap();
        assert!(vol.is_finite());
        assert!(vol >= 0.0);
    }

    #[test]
    fn test_free_function_matches_model() {
        let params = SABRParams::new(0.02, 0.3, 0.1, 0.5, 0.25).unwrap();
        let m = SABRModel::new(params, 0.012, 3.0).unwrap();
        assert_eq!(
            sabr_normal_vol(&params, 0.012, 0.02, 3.0).unwrap(),
            m.normal_vol(0.02).unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_normal_vol_is_finite_and_positive(
            alpha in 0.005f64..0.1,
            nu in 0.0f64..1.0,
            rho in -0.9f64..0.9,
            beta in 0.0f64..=1.0,
            forward in -0.01f64..0.06,
            offset in -0.03f64..0.03,
        ) {
            let params = SABRParams::new(alpha, nu, rho, beta, 0.25).unwrap();
            let m = SABRModel::new(params, forward, 2.0).unwrap();
            let vol = m.normal_vol(forward + offset).unwrap();
            prop_assert!(vol.is_finite());
            prop_assert!(vol > 0.0);
        }
    }
}
