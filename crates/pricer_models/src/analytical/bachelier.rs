//! Bachelier (normal) pricing model for European options.
//!
//! Interest-rate options are quoted in normal volatility: the swap rate
//! follows `dS = σ dW` under the annuity measure, so the undiscounted
//! option value is
//!
//! **Call**: C = (F - K)·N(d) + σ√T·φ(d)
//! **Put**:  P = (K - F)·N(-d) + σ√T·φ(d)
//!
//! with d = (F - K) / (σ√T). Negative forwards and strikes are allowed.

use pricer_core::math::solvers::{BrentSolver, SolverConfig};

use super::distributions::{norm_cdf, norm_pdf};
use super::error::AnalyticalError;
use super::OptionType;

/// Expiries at or below this are priced at intrinsic value.
const EXPIRY_EPSILON: f64 = 1e-12;

/// Largest normal volatility tried during inversion (1,000,000 bp).
const MAX_NORMAL_VOL: f64 = 100.0;

/// Bachelier model for a fixed forward and normal volatility.
///
/// # Example
///
/// ```
/// use pricer_models::analytical::Bachelier;
///
/// let model = Bachelier::new(0.01_f64, 0.006).unwrap();
/// let call = model.price_call(0.01, 1.0);
/// let put = model.price_put(0.01, 1.0);
///
/// // ATM: σ√T/√(2π)
/// assert!((call - 0.006 / (2.0 * std::f64::consts::PI).sqrt()).abs() < 1e-15);
/// assert!((call - put).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bachelier {
    forward: f64,
    volatility: f64,
}

impl Bachelier {
    /// Create a model; zero volatility is allowed and prices at intrinsic.
    pub fn new(forward: f64, volatility: f64) -> Result<Self, AnalyticalError> {
        if !(volatility >= 0.0) || !volatility.is_finite() {
            return Err(AnalyticalError::InvalidVolatility { volatility });
        }
        Ok(Self {
            forward,
            volatility,
        })
    }

    /// Forward rate.
    #[inline]
    pub fn forward(&self) -> f64 {
        self.forward
    }

    /// Normal volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Standard deviation of the terminal rate, or `None` when degenerate.
    #[inline]
    fn std_dev(&self, expiry: f64) -> Option<f64> {
        let v = self.volatility * expiry.max(0.0).sqrt();
        if expiry <= EXPIRY_EPSILON || v <= 0.0 {
            None
        } else {
            Some(v)
        }
    }

    /// Undiscounted call value.
    #[inline]
    pub fn price_call(&self, strike: f64, expiry: f64) -> f64 {
        let m = self.forward - strike;
        match self.std_dev(expiry) {
            None => m.max(0.0),
            Some(v) => {
                let d = m / v;
                m * norm_cdf(d) + v * norm_pdf(d)
            }
        }
    }

    /// Undiscounted put value.
    #[inline]
    pub fn price_put(&self, strike: f64, expiry: f64) -> f64 {
        let m = strike - self.forward;
        match self.std_dev(expiry) {
            None => m.max(0.0),
            Some(v) => {
                let d = m / v;
                m * norm_cdf(d) + v * norm_pdf(d)
            }
        }
    }

    /// Undiscounted value of either option type.
    #[inline]
    pub fn price(&self, option: OptionType, strike: f64, expiry: f64) -> f64 {
        match option {
            OptionType::Call => self.price_call(strike, expiry),
            OptionType::Put => self.price_put(strike, expiry),
        }
    }

    /// `E[((S - K)^+)^2]` for a call, `E[((K - S)^+)^2]` for a put.
    ///
    /// For `X ~ N(m, v²)`: `E[(X^+)^2] = (m² + v²)·N(m/v) + m·v·φ(m/v)`.
    pub fn second_moment(&self, option: OptionType, strike: f64, expiry: f64) -> f64 {
        let m = match option {
            OptionType::Call => self.forward - strike,
            OptionType::Put => strike - self.forward,
        };
        match self.std_dev(expiry) {
            None => m.max(0.0).powi(2),
            Some(v) => {
                let d = m / v;
                (m * m + v * v) * norm_cdf(d) + m * v * norm_pdf(d)
            }
        }
    }

    /// Sensitivity of the undiscounted price to σ: `√T·φ(d)`.
    pub fn vega(&self, strike: f64, expiry: f64) -> f64 {
        match self.std_dev(expiry) {
            None => 0.0,
            Some(v) => expiry.sqrt() * norm_pdf((self.forward - strike) / v),
        }
    }
}

/// Bachelier option value scaled by an annuity.
///
/// # Example
///
/// ```
/// use pricer_models::analytical::{bachelier_price, OptionType};
///
/// let price = bachelier_price(OptionType::Call, 0.02, 0.02, 0.005, 2.0, 4.5).unwrap();
/// assert!(price > 0.0);
/// ```
pub fn bachelier_price(
    option: OptionType,
    forward: f64,
    strike: f64,
    volatility: f64,
    expiry: f64,
    annuity: f64,
) -> Result<f64, AnalyticalError> {
    Ok(annuity * Bachelier::new(forward, volatility)?.price(option, strike, expiry))
}

/// Normal volatility reproducing an annuity-scaled option price.
///
/// The volatility is bracketed by doubling from 1% up to a cap and then
/// located by Brent's method. A price equal to intrinsic value gives zero.
///
/// # Errors
///
/// - `InvalidExpiry` if `expiry <= 0`
/// - `InvalidAnnuity` if `annuity <= 0`
/// - `ImpliedVolatility` if the price is below intrinsic value or above
///   what any volatility up to the cap reaches
///
/// # Example
///
/// ```
/// use pricer_models::analytical::{bachelier_implied_vol, bachelier_price, OptionType};
///
/// let price = bachelier_price(OptionType::Put, 0.015, 0.012, 0.0072, 1.5, 3.8).unwrap();
/// let vol = bachelier_implied_vol(OptionType::Put, 0.015, 0.012, 1.5, 3.8, price).unwrap();
/// assert!((vol - 0.0072).abs() < 1e-10);
/// ```
pub fn bachelier_implied_vol(
    option: OptionType,
    forward: f64,
    strike: f64,
    expiry: f64,
    annuity: f64,
    price: f64,
) -> Result<f64, AnalyticalError> {
    if !(expiry > 0.0) {
        return Err(AnalyticalError::InvalidExpiry { expiry });
    }
    if !(annuity > 0.0) {
        return Err(AnalyticalError::InvalidAnnuity { annuity });
    }

    let target = price / annuity;
    let intrinsic = match option {
        OptionType::Call => (forward - strike).max(0.0),
        OptionType::Put => (strike - forward).max(0.0),
    };
    let objective = |vol: f64| -> f64 {
        Bachelier {
            forward,
            volatility: vol,
        }
        .price(option, strike, expiry)
            - target
    };

    let slack = 1e-14 * (1.0 + intrinsic.abs());
    if !target.is_finite() || target < intrinsic - slack {
        return Err(AnalyticalError::ImpliedVolatility {
            price: target,
            reason: format!("below intrinsic value {}", intrinsic),
        });
    }
    if target <= intrinsic {
        return Ok(0.0);
    }

    let mut upper = 0.01;
    while objective(upper) < 0.0 {
        upper *= 2.0;
        if upper > MAX_NORMAL_VOL {
            return Err(AnalyticalError::ImpliedVolatility {
                price: target,
                reason: format!("above the value reached at volatility {}", MAX_NORMAL_VOL),
            });
        }
    }

    let solver = BrentSolver::new(SolverConfig::new(1e-15, 200));
    Ok(solver.find_root(objective, 0.0, upper)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // ==========================================================
    // Model
    // ==========================================================

    #[test]
    fn test_negative_volatility_rejected() {
        assert_eq!(
            Bachelier::new(0.01, -0.001),
            Err(AnalyticalError::InvalidVolatility { volatility: -0.001 })
        );
        assert!(Bachelier::new(0.01, f64::NAN).is_err());
    }

    #[test]
    fn test_zero_volatility_is_intrinsic() {
        let model = Bachelier::new(0.02, 0.0).unwrap();
        assert_eq!(model.price_call(0.01, 1.0), 0.01);
        assert_eq!(model.price_put(0.01, 1.0), 0.0);
    }

    #[test]
    fn test_negative_rates() {
        let model = Bachelier::new(-0.004, 0.005).unwrap();
        let call = model.price_call(-0.002, 2.0);
        let put = model.price_put(-0.002, 2.0);
        assert!(call > 0.0 && put > call);
        assert_relative_eq!(call - put, -0.004 + 0.002, epsilon = 1e-15);
    }

    #[test]
    fn test_second_moment_zero_strike_distance() {
        // ATM: E[(X^+)^2] = v²/2
        let model = Bachelier::new(0.01, 0.01).unwrap();
        let v2 = 0.01_f64.powi(2) * 4.0;
        assert_relative_eq!(
            model.second_moment(OptionType::Call, 0.01, 4.0),
            0.5 * v2,
            epsilon = 1e-18
        );
        assert_relative_eq!(
            model.second_moment(OptionType::Put, 0.01, 4.0),
            0.5 * v2,
            epsilon = 1e-18
        );
    }

    #[test]
    fn test_second_moments_sum_to_full_moment() {
        // E[(S-K)^2] = (F-K)^2 + v^2
        let model = Bachelier::new(0.015, 0.007).unwrap();
        let (k, t) = (0.02, 3.0);
        let call = model.second_moment(OptionType::Call, k, t);
        let put = model.second_moment(OptionType::Put, k, t);
        let total = call + put;
        assert_relative_eq!(total, (0.015 - k).powi(2) + 0.007_f64.powi(2) * t, epsilon = 1e-16);
    }

    // ==========================================================
    // Implied volatility
    // ==========================================================

    #[test]
    fn test_implied_vol_below_intrinsic_fails() {
        let result = bachelier_implied_vol(OptionType::Call, 0.02, 0.01, 1.0, 2.0, 0.015);
        assert!(matches!(result, Err(AnalyticalError::ImpliedVolatility { .. })));
    }

    #[test]
    fn test_implied_vol_at_intrinsic_is_zero() {
        let vol = bachelier_implied_vol(OptionType::Call, 0.02, 0.01, 1.0, 2.0, 0.02).unwrap();
        assert_eq!(vol, 0.0);
    }

    #[test]
    fn test_implied_vol_unreachable_price_fails() {
        let result = bachelier_implied_vol(OptionType::Call, 0.02, 0.02, 1.0, 1.0, 1e3);
        assert!(matches!(result, Err(AnalyticalError::ImpliedVolatility { .. })));
    }

    #[test]
    fn test_implied_vol_rejects_degenerate_inputs() {
        assert!(matches!(
            bachelier_implied_vol(OptionType::Call, 0.02, 0.02, 0.0, 1.0, 0.001),
            Err(AnalyticalError::InvalidExpiry { .. })
        ));
        assert!(matches!(
            bachelier_implied_vol(OptionType::Call, 0.02, 0.02, 1.0, 0.0, 0.001),
            Err(AnalyticalError::InvalidAnnuity { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_put_call_parity(
            forward in -0.01f64..0.05,
            strike in -0.01f64..0.05,
            vol in 0.0f64..0.02,
            expiry in 0.1f64..30.0,
        ) {
            let model = Bachelier::new(forward, vol).unwrap();
            let parity = model.price_call(strike, expiry) - model.price_put(strike, expiry);
            prop_assert!((parity - (forward - strike)).abs() < 1e-14);
        }

        #[test]
        fn prop_implied_vol_recovers_input(
            forward in -0.005f64..0.04,
            offset_bp in -200.0f64..200.0,
            vol in 0.001f64..0.02,
            expiry in 0.25f64..20.0,
        ) {
            let strike = forward + offset_bp * 1e-4;
            // Out-of-the-money side keeps the time value well above rounding.
            let option = if strike >= forward { OptionType::Call } else { OptionType::Put };
            let price = bachelier_price(option, forward, strike, vol, expiry, 1.0).unwrap();
            prop_assume!(price > 1e-9);
            let implied =
                bachelier_implied_vol(option, forward, strike, expiry, 1.0, price).unwrap();
            prop_assert!((implied - vol).abs() < 1e-8);
        }
    }
}
