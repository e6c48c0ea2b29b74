// crates/xtes-vault/src/discount.rs
//
// Discount curve for locked exits.
//
// A lock pays out a fraction of the fair value of its shares that grows
// linearly with the chosen duration: 50% at the minimum allowed duration,
// 100% at the maximum. Fair value and payout are floored independently, in
// that order, so the payout at the maximum duration always equals the
// floored fair value.

use serde::{Deserialize, Serialize};
use xtes_core::XtesError;

use crate::token::{mul_div, ExchangeRate, SCALE};

/// Payout fraction at the minimum duration (0.5).
pub const MIN_PAYOUT_FRACTION: u128 = SCALE / 2;

/// Value of a lock at a given exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Base-token value of the shares at the current rate, floored.
    pub fair_value: u128,
    /// Amount the owner receives after the duration discount, floored.
    pub payout: u128,
}

impl Quote {
    /// Portion of fair value the owner gives up.
    pub fn penalty(&self) -> u128 {
        self.fair_value - self.payout
    }
}

/// Payout fraction for `duration`, scaled by `SCALE`.
///
/// Durations at or beyond `max` pay in full and durations at or below `min`
/// pay half. Only locks created before a bounds change can fall outside
/// `[min, max]`.
pub fn payout_fraction(duration: u64, min: u64, max: u64) -> u128 {
    if duration >= max {
        return SCALE;
    }
    if duration <= min {
        return MIN_PAYOUT_FRACTION;
    }
    // min < duration < max here, so the span is non-zero
    let elapsed = u128::from(duration - min);
    let span = u128::from(max - min);
    MIN_PAYOUT_FRACTION + MIN_PAYOUT_FRACTION * elapsed / span
}

/// Quote `shares` locked for `duration` at `rate`.
pub fn quote(
    shares: u128,
    duration: u64,
    rate: ExchangeRate,
    min: u64,
    max: u64,
) -> Result<Quote, XtesError> {
    let fair_value = rate.value_of(shares)?;
    let fraction = payout_fraction(duration, min, max);
    let payout = mul_div(fair_value, fraction, SCALE, "lock payout")?;
    Ok(Quote { fair_value, payout })
}
