//! Stake calculator.
//!
//! Converts a requested fraction of the balance into a whole-euro stake and
//! validates caller-supplied stakes before any page interaction.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::types::{Stake, WagerError};

/// Smallest stake the site accepts, in euros.
pub const MIN_STAKE: Decimal = Decimal::ONE;

/// Stake for `fraction` of `balance`: rounded half-to-even to whole euros,
/// never below `MIN_STAKE`. Non-positive fractions yield the minimum.
pub fn compute_stake(balance: Decimal, fraction: Decimal) -> Decimal {
    if fraction <= Decimal::ZERO {
        return MIN_STAKE;
    }

    let raw = fraction * balance;
    let stake = raw
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .max(MIN_STAKE);

    debug!(
        fraction = %fraction,
        pct = format!("{:.1}%", fraction * Decimal::ONE_HUNDRED),
        balance = %balance,
        raw = format!("{:.2}", raw),
        stake = %stake,
        "Stake computed"
    );
    stake
}

/// Resolve a requested stake to the amount that will be typed on the slip.
///
/// Absolute stakes pass through unchanged but must be positive; fractions
/// above 1 are rejected rather than clamped.
pub fn resolve_stake(stake: &Stake, balance: Decimal) -> Result<Decimal, WagerError> {
    match *stake {
        Stake::Amount(amount) if amount <= Decimal::ZERO => Err(WagerError::InvalidStake(
            format!("amount must be positive, got {amount}"),
        )),
        Stake::Amount(amount) => Ok(amount),
        Stake::Fraction(fraction) if fraction > Decimal::ONE => Err(WagerError::InvalidStake(
            format!("fraction must be at most 1, got {fraction}"),
        )),
        Stake::Fraction(fraction) => Ok(compute_stake(balance, fraction)),
    }
}

/// Text typed into the stake input: integral amounts without decimals.
pub fn stake_text(stake: Decimal) -> String {
    stake.normalize().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
