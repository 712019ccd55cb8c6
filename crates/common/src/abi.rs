//! Contract Call Encoding
//!
//! Only the writes the mini app submits are declared here. Reads go
//! through the pool reader, which returns decoded values.

use alloy_sol_types::{sol, SolCall};

use crate::types::{Address, Call, TokenAmount, U256};

sol! {
    /// ERC-20 allowance management
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Co-mining pool funded with an ERC-20 token
    interface ICoMiningPool {
        function deposit(uint256 amount) external;
        function withdrawFromCurrentPool(uint256 shares) external;
    }

    /// Co-mining pool funded with the chain's native asset
    interface INativeCoMiningPool {
        function deposit() external payable;
    }
}

/// `token.approve(spender, amount)`
pub fn approve_call(token: Address, spender: Address, amount: TokenAmount) -> Call {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    Call::new(token, data)
}

/// `pool.deposit(amount)` for token pools
pub fn deposit_call(pool: Address, amount: TokenAmount) -> Call {
    let data = ICoMiningPool::depositCall { amount }.abi_encode();
    Call::new(pool, data)
}

/// `pool.deposit{value: amount}()` for native pools
pub fn native_deposit_call(pool: Address, amount: TokenAmount) -> Call {
    let data = INativeCoMiningPool::depositCall {}.abi_encode();
    Call::new(pool, data).with_value(amount)
}

/// `pool.withdrawFromCurrentPool(shares)`
pub fn withdraw_call(pool: Address, shares: U256) -> Call {
    let data = ICoMiningPool::withdrawFromCurrentPoolCall { shares }.abi_encode();
    Call::new(pool, data)
}

/// Decode the amount argument of an `approve` call
pub fn decode_approve(call: &Call) -> Option<(Address, TokenAmount)> {
    IERC20::approveCall::abi_decode(&call.data, true)
        .ok()
        .map(|c| (c.spender, c.amount))
}

/// Decode the amount argument of a token-pool `deposit` call
pub fn decode_deposit(call: &Call) -> Option<TokenAmount> {
    ICoMiningPool::depositCall::abi_decode(&call.data, true)
        .ok()
        .map(|c| c.amount)
}
