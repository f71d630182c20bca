//! Collateral valuation
//!
//! `max_borrowable = floor(floor(collateral * rate / scale) * ltv / 100)`
//!
//! The two truncating divisions happen in that order. Folding them into a
//! single `collateral * rate * ltv / (scale * 100)` rounds differently for
//! small positions and must not be done.

use crate::types::Amount;
use crate::{Error, Result};
use primitive_types::U256;

/// LTV ratios are whole percentages
pub const LTV_DENOMINATOR: Amount = 100;

/// Default fixed-point scale of oracle rates (18 decimals)
pub const DEFAULT_PRICE_SCALE: Amount = 1_000_000_000_000_000_000;

/// Default LTV ratio (percent)
pub const DEFAULT_LTV_RATIO: u64 = 75;

/// Settlement-asset value of `collateral` at `rate`, truncated.
///
/// The product is taken in 256 bits, so only a quotient above
/// [`Amount::MAX`] overflows.
pub fn collateral_value(collateral: Amount, rate: Amount, price_scale: Amount) -> Result<Amount> {
    if price_scale == 0 {
        return Err(Error::Overflow("price scale is zero".to_string()));
    }

    let value = U256::from(collateral) * U256::from(rate) / U256::from(price_scale);
    narrow(value).ok_or_else(|| {
        Error::Overflow(format!(
            "collateral {} at rate {} / {} exceeds the amount range",
            collateral, rate, price_scale
        ))
    })
}

/// Maximum debt `collateral` supports at `rate` under `ltv_ratio`
pub fn max_borrowable(
    collateral: Amount,
    rate: Amount,
    price_scale: Amount,
    ltv_ratio: u64,
) -> Result<Amount> {
    if collateral == 0 {
        return Ok(0);
    }

    let value = collateral_value(collateral, rate, price_scale)?;
    let max = U256::from(value) * U256::from(ltv_ratio) / U256::from(LTV_DENOMINATOR);

    narrow(max).ok_or_else(|| {
        Error::Overflow(format!("collateral value {} * ltv {} / 100", value, ltv_ratio))
    })
}

fn narrow(value: U256) -> Option<Amount> {
    if value > U256::from(Amount::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}
