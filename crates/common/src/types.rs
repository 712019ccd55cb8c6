//! Core Types for the Donuettes Mini App
//!
//! Data structures shared by the deposit flow and the pool session.
//! Chain values use the alloy primitives so they round-trip through any
//! wallet connector without conversion.

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, Bytes, TxHash, U256};

/// Token amount in base units (18 decimals)
pub type TokenAmount = U256;

/// Sequential pool identifier assigned by the co-mining contract
pub type PoolId = U256;

// ============ Wallet Types ============

/// What the connected wallet connector can submit
///
/// Determined once per connection and never changed during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WalletCapability {
    /// Can execute several calls as one atomic unit
    AtomicBatch,
    /// One transaction per signature
    #[default]
    Sequential,
}

impl WalletCapability {
    /// Returns true if the connector accepts atomic call batches
    pub fn supports_batching(&self) -> bool {
        matches!(self, Self::AtomicBatch)
    }
}

/// A single encoded contract write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Contract being called
    pub to: Address,
    /// ABI-encoded calldata
    pub data: Bytes,
    /// Native value attached (zero for token calls)
    pub value: U256,
}

impl Call {
    /// Creates a call with no native value attached
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self { to, data: data.into(), value: U256::ZERO }
    }

    /// Attaches native value to the call
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// First four bytes of calldata
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// Identifier returned by a batched submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub String);

impl core::fmt::Display for BatchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle for anything whose status can be polled
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionId {
    /// Single transaction
    Transaction(TxHash),
    /// Atomic call batch
    Batch(BatchId),
}

impl core::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transaction(hash) => write!(f, "tx:{hash}"),
            Self::Batch(id) => write!(f, "batch:{id}"),
        }
    }
}

/// Execution status of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Not yet included, or still executing
    Pending,
    /// Confirmed
    Success,
    /// Reverted or dropped, with the reason when the node reports one
    Failure { reason: Option<String> },
}

impl TxStatus {
    /// Returns true once polling can stop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

// ============ Pool Types ============

/// What a pool accepts as deposits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum PoolAsset {
    /// ERC-20 token; deposits need an allowance
    Token(Address),
    /// Chain native asset; deposits attach value
    Native,
}

impl PoolAsset {
    /// Returns true if deposits must be preceded by an approval
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::Token(_))
    }
}

/// Aggregate state of one pool, as returned by `getPoolDetails`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolDetails {
    /// Sum of all deposits
    pub total_deposited: TokenAmount,
    /// Shares issued against those deposits
    pub total_shares: U256,
    /// Distinct depositors
    pub participants: U256,
}

/// One user's stake in the current pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPosition {
    /// Amount deposited
    pub deposited: TokenAmount,
    /// Shares held
    pub shares: U256,
    /// Share of the pool in basis points
    pub share_bps: U256,
}

impl UserPosition {
    /// Returns true if the user has anything to withdraw
    pub fn has_deposit(&self) -> bool {
        !self.deposited.is_zero()
    }
}
