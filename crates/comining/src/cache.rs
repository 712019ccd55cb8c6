//! Read Cache
//!
//! Last values read from the chain. Nothing here is ever adjusted locally:
//! values are replaced by fresh reads or dropped on invalidation.

use donuette_common::TokenAmount;

/// Most recent balance and allowance reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadCache {
    balance: Option<TokenAmount>,
    allowance: Option<TokenAmount>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Option<TokenAmount> {
        self.balance
    }

    pub fn allowance(&self) -> Option<TokenAmount> {
        self.allowance
    }

    pub fn record_balance(&mut self, balance: TokenAmount) {
        self.balance = Some(balance);
    }

    pub fn record_allowance(&mut self, allowance: TokenAmount) {
        self.allowance = Some(allowance);
    }

    /// Drop everything so the next reader goes back to the chain
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_none() && self.allowance.is_none()
    }
}
