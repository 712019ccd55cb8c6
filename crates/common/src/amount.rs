//! Amount Parsing and Formatting
//!
//! The amount field holds whatever the user typed. Before anything reaches
//! a wallet it is converted to an 18-decimal fixed-point integer.

use alloy_primitives::utils::{format_ether, parse_ether};

use crate::constants::{precision, token};
use crate::errors::{AmountErrorReason, DonutError, DonutResult};
use crate::types::TokenAmount;

/// Parse a user-entered decimal string into token base units.
///
/// Accepts `"10"`, `"10.5"`, `".5"` and `"5."`. Digits beyond the 18th
/// decimal place are truncated. Zero parses successfully; callers decide
/// whether zero is acceptable.
///
/// # Errors
///
/// * `EmptyAmount` - blank input
/// * `InvalidAmount` - negative, non-numeric or too large for 256 bits
pub fn parse_amount(input: &str) -> DonutResult<TokenAmount> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DonutError::EmptyAmount);
    }

    let invalid = |reason| DonutError::InvalidAmount {
        input: input.to_string(),
        reason,
    };

    if trimmed.starts_with('-') {
        return Err(invalid(AmountErrorReason::Negative));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid(AmountErrorReason::NotNumeric));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = &fraction[..fraction.len().min(token::DECIMALS as usize)];
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    parse_ether(&normalized).map_err(|_| invalid(AmountErrorReason::TooLarge))
}

/// Format base units for display with two decimal places.
///
/// Rounds the way the web client's `toFixed(2)` did.
pub fn format_donut(amount: TokenAmount) -> String {
    let full = format_ether(amount);
    match full.parse::<f64>() {
        Ok(value) => format!("{value:.prec$}", prec = precision::DISPLAY_DECIMALS),
        Err(_) => full,
    }
}
