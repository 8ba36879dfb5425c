//! Quoting-convention conversion and the cash-to-physical smile shift.
//!
//! Every conversion passes through payer normal volatility: receiver quotes
//! are moved to payer space by put-call parity (a receiver at `+m` is the
//! payer at `-m`), then re-expressed in the target convention.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::debug;

use super::error::SwaptionError;
use super::lattice::{QuoteKind, QuotingConvention, Settlement, SwaptionLattice};
use super::market::SwaptionMarket;
use super::swap::ForwardSwap;
use super::SwaptionType;
use crate::analytical::{
    bachelier_implied_vol, bachelier_price, black_implied_vol, black_price, AnalyticalError,
    OptionType,
};

/// One basis point.
const BP: f64 = 1e-4;

/// Market state of one (maturity, tenor) needed to move between conventions.
struct QuoteContext<'a> {
    swap: &'a ForwardSwap,
    annuity: f64,
    displacement: f64,
    maturity: i32,
    tenor: i32,
}

impl QuoteContext<'_> {
    fn strike(&self, payer_moneyness: i32) -> f64 {
        self.swap.par_rate() + BP * payer_moneyness as f64
    }

    fn inversion_failure(&self, moneyness: i32, err: AnalyticalError) -> SwaptionError {
        SwaptionError::ImpliedVolatilityInversionFailure {
            maturity: self.maturity,
            tenor: self.tenor,
            moneyness,
            reason: err.to_string(),
        }
    }

    /// Quote in `convention` at its own moneyness to (payer moneyness, payer normal vol).
    fn to_payer_normal(
        &self,
        convention: QuotingConvention,
        moneyness: i32,
        value: f64,
    ) -> Result<(i32, f64), SwaptionError> {
        let side = convention.side();
        let payer_moneyness = match side {
            SwaptionType::Payer => moneyness,
            SwaptionType::Receiver => -moneyness,
        };
        let strike = self.strike(payer_moneyness);
        let (forward, expiry) = (self.swap.par_rate(), self.swap.expiry());

        let price = match convention.kind() {
            QuoteKind::NormalVol => return Ok((payer_moneyness, value)),
            QuoteKind::Price => value,
            QuoteKind::LognormalVol => black_price(
                side.option_type(),
                forward,
                strike,
                value,
                expiry,
                self.annuity,
                self.displacement,
            )?,
        };
        let payer_price = match side {
            SwaptionType::Payer => price,
            SwaptionType::Receiver => price + (forward - strike) * self.annuity,
        };
        let vol = bachelier_implied_vol(
            OptionType::Call,
            forward,
            strike,
            expiry,
            self.annuity,
            payer_price,
        )
        .map_err(|e| self.inversion_failure(moneyness, e))?;
        Ok((payer_moneyness, vol))
    }

    /// Payer normal vol at payer moneyness to (own moneyness, value) in `target`.
    fn from_payer_normal(
        &self,
        target: QuotingConvention,
        payer_moneyness: i32,
        vol: f64,
    ) -> Result<(i32, f64), SwaptionError> {
        let side = target.side();
        let moneyness = match side {
            SwaptionType::Payer => payer_moneyness,
            SwaptionType::Receiver => -payer_moneyness,
        };
        let strike = self.strike(payer_moneyness);
        let (forward, expiry) = (self.swap.par_rate(), self.swap.expiry());

        let value = match target.kind() {
            QuoteKind::NormalVol => vol,
            QuoteKind::Price => {
                bachelier_price(side.option_type(), forward, strike, vol, expiry, self.annuity)?
            }
            QuoteKind::LognormalVol => {
                let option = side.option_type();
                let price = bachelier_price(option, forward, strike, vol, expiry, self.annuity)?;
                black_implied_vol(
                    side.option_type(),
                    forward,
                    strike,
                    expiry,
                    self.annuity,
                    self.displacement,
                    price,
                )
                .map_err(|e| self.inversion_failure(moneyness, e))?
            }
        };
        Ok((moneyness, value))
    }
}

impl SwaptionLattice {
    /// Re-expresses every entry in another quoting convention.
    ///
    /// Settlement is kept: cash lattices use the cash annuity at par,
    /// physical lattices the forward annuity `A(0)/P(0, T)`. Receiver entries
    /// move to the mirrored moneyness when the side changes. A lattice
    /// already in `target` is returned unchanged.
    pub fn convert(
        &self,
        target: QuotingConvention,
        market: &SwaptionMarket,
    ) -> Result<SwaptionLattice, SwaptionError> {
        if self.convention() == target {
            return Ok(self.clone());
        }

        let meta = self.meta();
        let mut swaps: BTreeMap<(i32, i32), ForwardSwap> = BTreeMap::new();
        let mut builder = SwaptionLattice::builder(meta.clone().with_convention(target));

        for point in self.iter() {
            let swap = match swaps.entry((point.maturity, point.tenor)) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    e.insert(meta.terms(point.maturity, point.tenor).forward_swap(market)?)
                }
            };
            let context = QuoteContext {
                annuity: swap.settlement_annuity(meta.settlement),
                swap,
                displacement: meta.displacement,
                maturity: point.maturity,
                tenor: point.tenor,
            };
            let (payer_moneyness, vol) =
                context.to_payer_normal(self.convention(), point.moneyness, point.value)?;
            let (moneyness, value) = context.from_payer_normal(target, payer_moneyness, vol)?;
            builder.insert(point.maturity, point.tenor, moneyness, value)?;
        }

        Ok(builder.build())
    }

    /// Converts `other` to this lattice's convention and merges it in.
    ///
    /// Settlements must agree; overlapping coordinates fail with
    /// `DuplicateEntry`.
    pub fn append(
        &self,
        other: &SwaptionLattice,
        market: &SwaptionMarket,
    ) -> Result<SwaptionLattice, SwaptionError> {
        let converted = other.convert(self.convention(), market)?;
        self.merge(&converted)
    }
}

/// Implied payer normal volatilities of a cash-settled price lattice.
///
/// Accepts `PAYER_PRICE` or `RECEIVER_PRICE` with cash settlement; anything
/// else fails with `InvalidConvention`.
pub fn cash_prices_to_normal_vols(
    market: &SwaptionMarket,
    lattice: &SwaptionLattice,
) -> Result<SwaptionLattice, SwaptionError> {
    if lattice.convention().kind() != QuoteKind::Price {
        return Err(SwaptionError::InvalidConvention {
            expected: "PAYER_PRICE or RECEIVER_PRICE".into(),
            found: lattice.convention().to_string(),
        });
    }
    if lattice.settlement() != Settlement::Cash {
        return Err(SwaptionError::InvalidConvention {
            expected: Settlement::Cash.to_string(),
            found: lattice.settlement().to_string(),
        });
    }
    lattice.convert(QuotingConvention::PayerVolNormal, market)
}

/// Extends a physical smile with the skew of cash-settled smiles.
///
/// Each cash point `(maturity, tenor, m)` with `m != 0` becomes the physical
/// vol `phys(0) + cash(m) - cash(0)`, all in payer normal vols. Points whose
/// ATM anchor is missing from either lattice are skipped. Cash lattices are
/// applied in order; a coordinate already present fails with
/// `DuplicateEntry`.
pub fn shift_cash_to_physical_smile(
    market: &SwaptionMarket,
    physical: &SwaptionLattice,
    cash_lattices: &[SwaptionLattice],
) -> Result<SwaptionLattice, SwaptionError> {
    let physical = physical.convert(QuotingConvention::PayerVolNormal, market)?;
    let mut builder = physical.to_builder();

    for cash in cash_lattices {
        let cash = cash.convert(QuotingConvention::PayerVolNormal, market)?;
        for point in cash.iter().filter(|p| p.moneyness != 0) {
            let anchors = (
                physical.get(point.maturity, point.tenor, 0),
                cash.get(point.maturity, point.tenor, 0),
            );
            match anchors {
                (Some(physical_atm), Some(cash_atm)) => builder.insert(
                    point.maturity,
                    point.tenor,
                    point.moneyness,
                    physical_atm + point.value - cash_atm,
                )?,
                _ => debug!(
                    maturity = point.maturity,
                    tenor = point.tenor,
                    moneyness = point.moneyness,
                    "skipping cash smile point without ATM anchor"
                ),
            }
        }
    }

    Ok(builder.build())
}
