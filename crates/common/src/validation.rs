//! Validation Helpers
//!
//! The local gate in front of every submission. Anything rejected here
//! never reaches a wallet or a node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use donuette_common::validation::{check, validate_deposit_input};
//!
//! check!(!amount.is_zero(), DonutError::ZeroAmount);
//!
//! let amount = validate_deposit_input("10", balance)?;
//! ```

use crate::{
    amount::parse_amount,
    errors::{DonutError, DonutResult},
    types::TokenAmount,
};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// # Examples
///
/// ```rust,ignore
/// check!(amount <= balance, DonutError::InsufficientBalance {
///     available: balance,
///     requested: amount,
/// });
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use check;

// ============ Amount Helpers ============

/// Require an amount to be non-zero.
pub fn require_non_zero(amount: TokenAmount) -> DonutResult<()> {
    check!(!amount.is_zero(), DonutError::ZeroAmount);
    Ok(())
}

/// Require sufficient balance for an operation.
pub fn require_sufficient_balance(available: TokenAmount, requested: TokenAmount) -> DonutResult<()> {
    check!(
        requested <= available,
        DonutError::InsufficientBalance { available, requested }
    );
    Ok(())
}

/// Validate the deposit field against the wallet balance.
///
/// Rejects empty, non-numeric and zero input, and amounts above the
/// balance. Returns the amount in base units.
pub fn validate_deposit_input(input: &str, balance: TokenAmount) -> DonutResult<TokenAmount> {
    let amount = parse_amount(input)?;
    require_non_zero(amount)?;
    require_sufficient_balance(balance, amount)?;
    Ok(amount)
}

/// Validate the withdraw field.
///
/// Withdrawals are bounded by the contract, not by the wallet balance, so
/// only the shape of the input is checked here.
pub fn validate_withdraw_input(input: &str) -> DonutResult<TokenAmount> {
    let amount = parse_amount(input)?;
    require_non_zero(amount)?;
    Ok(amount)
}
