//! Pool Read Model
//!
//! One consistent view of the current pool for rendering: auction progress,
//! the user's stake and what they can deposit.

use donuette_common::constants::{token, ui};
use donuette_common::math::{bps_to_percent, is_ready_to_mine, progress_bps, progress_percent};
use donuette_common::{format_donut, PoolDetails, PoolId, TokenAmount, UserPosition, U256};

/// Point-in-time view of the pool and the connected user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub pool_id: PoolId,
    pub details: PoolDetails,
    /// Current auction price of the next mining slot
    pub price: TokenAmount,
    pub position: UserPosition,
    /// `None` when the contract minimum could not be read
    pub min_deposit: Option<TokenAmount>,
    /// Spendable balance of the deposit asset
    pub balance: TokenAmount,
}

impl PoolSnapshot {
    /// Progress toward the auction price in basis points
    pub fn progress_bps(&self) -> U256 {
        progress_bps(self.details.total_deposited, self.price)
    }

    /// Progress toward the auction price, capped at 100
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.details.total_deposited, self.price).min(100.0)
    }

    pub fn is_ready_to_mine(&self) -> bool {
        is_ready_to_mine(self.details.total_deposited, self.price)
    }

    /// Share of the pool held by the user, in percent
    pub fn pool_share_percent(&self) -> f64 {
        bps_to_percent(self.position.share_bps)
    }

    /// Minimum deposit for display
    pub fn min_deposit_display(&self) -> String {
        match self.min_deposit {
            Some(min) => format_donut(min),
            None => ui::FALLBACK_MIN_DEPOSIT.to_string(),
        }
    }

    /// Quick-pick amounts the user can afford
    pub fn affordable_quick_amounts(&self) -> Vec<u32> {
        ui::QUICK_AMOUNTS
            .iter()
            .copied()
            .filter(|n| {
                let wanted = U256::from(*n) * U256::from(token::ONE);
                wanted <= self.balance
            })
            .collect()
    }
}
