//! Displaced (shifted) Black model.
//!
//! Lognormal swaption quotes are Black volatilities of `S + d` for a fixed
//! displacement `d`, which keeps the model usable with negative rates:
//!
//! **Call**: C = F'·N(d₁) - K'·N(d₂)
//! **Put**:  P = K'·N(-d₂) - F'·N(-d₁)
//!
//! with F' = F + d, K' = K + d, d₁ = (ln(F'/K') + σ²T/2) / (σ√T), d₂ = d₁ - σ√T.

use pricer_core::math::solvers::{BrentSolver, SolverConfig};

use super::distributions::norm_cdf;
use super::error::AnalyticalError;
use super::OptionType;

const MAX_LOGNORMAL_VOL: f64 = 20.0;

/// Displaced Black model for a fixed forward, volatility and displacement.
///
/// # Example
///
/// ```
/// use pricer_models::analytical::DisplacedBlack;
///
/// let model = DisplacedBlack::new(-0.001, 0.25, 0.01).unwrap();
/// let call = model.price_call(0.0, 2.0).unwrap();
/// let put = model.price_put(0.0, 2.0).unwrap();
/// assert!((call - put - (-0.001)).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacedBlack {
    forward: f64,
    volatility: f64,
    displacement: f64,
}

impl DisplacedBlack {
    /// Create a model; `forward + displacement` must be positive.
    pub fn new(forward: f64, volatility: f64, displacement: f64) -> Result<Self, AnalyticalError> {
        if !(volatility >= 0.0) || !volatility.is_finite() {
            return Err(AnalyticalError::InvalidVolatility { volatility });
        }
        if !(forward + displacement > 0.0) {
            return Err(AnalyticalError::NonPositiveDisplaced {
                what: "forward",
                value: forward + displacement,
            });
        }
        Ok(Self {
            forward,
            volatility,
            displacement,
        })
    }

    /// Lognormal volatility of the displaced rate.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    fn price_with(
        &self,
        option: OptionType,
        strike: f64,
        expiry: f64,
    ) -> Result<f64, AnalyticalError> {
        let f = self.forward + self.displacement;
        let k = strike + self.displacement;
        if !(k > 0.0) {
            return Err(AnalyticalError::NonPositiveDisplaced {
                what: "strike",
                value: k,
            });
        }

        let v = self.volatility * expiry.max(0.0).sqrt();
        if v <= 0.0 {
            return Ok(match option {
                OptionType::Call => (f - k).max(0.0),
                OptionType::Put => (k - f).max(0.0),
            });
        }

        let d1 = ((f / k).ln() + 0.5 * v * v) / v;
        let d2 = d1 - v;
        Ok(match option {
            OptionType::Call => f * norm_cdf(d1) - k * norm_cdf(d2),
            OptionType::Put => k * norm_cdf(-d2) - f * norm_cdf(-d1),
        })
    }

    /// Undiscounted call value.
    pub fn price_call(&self, strike: f64, expiry: f64) -> Result<f64, AnalyticalError> {
        self.price_with(OptionType::Call, strike, expiry)
    }

    /// Undiscounted put value.
    pub fn price_put(&self, strike: f64, expiry: f64) -> Result<f64, AnalyticalError> {
        self.price_with(OptionType::Put, strike, expiry)
    }

    /// Undiscounted value of either option type.
    pub fn price(
        &self,
        option: OptionType,
        strike: f64,
        expiry: f64,
    ) -> Result<f64, AnalyticalError> {
        self.price_with(option, strike, expiry)
    }
}

/// Displaced Black option value scaled by an annuity.
pub fn black_price(
    option: OptionType,
    forward: f64,
    strike: f64,
    volatility: f64,
    expiry: f64,
    annuity: f64,
    displacement: f64,
) -> Result<f64, AnalyticalError> {
    let model = DisplacedBlack::new(forward, volatility, displacement)?;
    Ok(annuity * model.price(option, strike, expiry)?)
}

/// Displaced lognormal volatility reproducing an annuity-scaled price.
///
/// ```
/// use pricer_models::analytical::{black_implied_vol, black_price, OptionType};
///
/// let p = black_price(OptionType::Call, 0.01, 0.015, 0.3, 5.0, 4.2, 0.02).unwrap();
/// let vol = black_implied_vol(OptionType::Call, 0.01, 0.015, 5.0, 4.2, 0.02, p).unwrap();
/// assert!((vol - 0.3).abs() < 1e-9);
/// ```
pub fn black_implied_vol(
    option: OptionType,
    forward: f64,
    strike: f64,
    expiry: f64,
    annuity: f64,
    displacement: f64,
    price: f64,
) -> Result<f64, AnalyticalError> {
    if !(expiry > 0.0) {
        return Err(AnalyticalError::InvalidExpiry { expiry });
    }
    if !(annuity > 0.0) {
        return Err(AnalyticalError::InvalidAnnuity { annuity });
    }

    let target = price / annuity;
    let model = |vol: f64| DisplacedBlack::new(forward, vol, displacement);
    let intrinsic = model(0.0)?.price(option, strike, expiry)?;

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

    let objective = |vol: f64| -> f64 {
        model(vol)
            .and_then(|m| m.price(option, strike, expiry))
            .map_or(f64::NAN, |p| p - target)
    };

    let mut upper = 0.1;
    while objective(upper) < 0.0 {
        upper *= 2.0;
        if upper > MAX_LOGNORMAL_VOL {
            return Err(AnalyticalError::ImpliedVolatility {
                price: target,
                reason: format!("above the value reached at volatility {}", MAX_LOGNORMAL_VOL),
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

    #[test]
    fn test_non_positive_displaced_forward_rejected() {
        assert!(matches!(
            DisplacedBlack::new(-0.03, 0.2, 0.02),
            Err(AnalyticalError::NonPositiveDisplaced { what: "forward", .. })
        ));
    }

    #[test]
    fn test_non_positive_displaced_strike_rejected() {
        let model = DisplacedBlack::new(0.01, 0.2, 0.02).unwrap();
        assert!(model.price_call(-0.05, 1.0).is_err());
    }

    #[test]
    fn test_zero_displacement_is_plain_black() {
        // F = K = 1, σ√T = 0.2: C = 2N(0.1) - 1
        let model = DisplacedBlack::new(1.0, 0.2, 0.0).unwrap();
        assert_relative_eq!(
            model.price_call(1.0, 1.0).unwrap(),
            2.0 * norm_cdf(0.1) - 1.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_put_implied_vol_round_trip() {
        let p = black_price(OptionType::Put, 0.012, 0.009, 0.45, 2.0, 1.9, 0.01).unwrap();
        let vol = black_implied_vol(OptionType::Put, 0.012, 0.009, 2.0, 1.9, 0.01, p).unwrap();
        assert_relative_eq!(vol, 0.45, epsilon = 1e-9);
    }
}
