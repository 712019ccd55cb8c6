//! Pool Math
//!
//! Values the mini app derives from raw pool reads. The contracts own the
//! real accounting; these only feed the progress bar, the status badge and
//! the withdraw call.

use alloy_primitives::U256;

use crate::constants::precision::BPS_DENOMINATOR;
use crate::errors::{DonutError, DonutResult};
use crate::types::TokenAmount;

/// Progress of the pool towards the current auction price, in basis points
///
/// progress = total_deposited * 10_000 / price
///
/// Returns 0 when the price is 0 (auction expired). Not capped at 100%.
pub fn progress_bps(total_deposited: TokenAmount, price: TokenAmount) -> U256 {
    if price.is_zero() {
        return U256::ZERO;
    }
    total_deposited.saturating_mul(U256::from(BPS_DENOMINATOR)) / price
}

/// Progress as a display percentage with two decimals (e.g. 42.17)
pub fn progress_percent(total_deposited: TokenAmount, price: TokenAmount) -> f64 {
    bps_to_percent(progress_bps(total_deposited, price))
}

/// Check if the pool has raised enough to mine at the current price
pub fn is_ready_to_mine(total_deposited: TokenAmount, price: TokenAmount) -> bool {
    !price.is_zero() && total_deposited >= price
}

/// Convert a token amount to pool shares for `withdrawFromCurrentPool`
///
/// shares = amount * total_shares / total_deposited
///
/// # Errors
///
/// * `EmptyPool` - the pool holds no deposits
/// * `Overflow` - the product does not fit in 256 bits
pub fn shares_for_withdrawal(
    amount: TokenAmount,
    total_shares: U256,
    total_deposited: TokenAmount,
) -> DonutResult<U256> {
    if total_deposited.is_zero() {
        return Err(DonutError::EmptyPool);
    }

    amount
        .checked_mul(total_shares)
        .ok_or(DonutError::Overflow)?
        .checked_div(total_deposited)
        .ok_or(DonutError::DivisionByZero)
}

/// Pool share for display (share_bps / 100)
pub fn bps_to_percent(bps: U256) -> f64 {
    let clamped: u64 = bps.try_into().unwrap_or(u64::MAX);
    clamped as f64 / 100.0
}
