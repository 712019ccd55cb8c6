//! Error Types for the Donuettes Mini App
//!
//! Every failure is scoped to a single deposit or withdraw attempt. None of
//! them is fatal to the application; the flow returns to idle and the rest
//! of the UI stays responsive.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Donuettes operations
pub type DonutResult<T> = Result<T, DonutError>;

/// Main error enum for all client-side failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DonutError {
    // ============ Input Errors ============
    /// Amount field is empty
    #[error("amount is empty")]
    EmptyAmount,

    /// Amount field does not parse as a non-negative decimal
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: AmountErrorReason },

    /// Amount parsed to zero
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Amount exceeds the wallet balance
    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: U256, requested: U256 },

    // ============ Flow Errors ============
    /// A deposit is already in flight for this session
    #[error("a deposit is already in progress ({state})")]
    FlowInProgress { state: &'static str },

    /// Input not accepted in the current state
    #[error("input {input} is not valid in state {state}")]
    InvalidStateTransition {
        state: &'static str,
        input: &'static str,
    },

    /// Status reported for a submission the flow is not watching
    #[error("status reported for an unknown submission")]
    UnknownSubmission,

    // ============ Transaction Errors ============
    /// Submission or execution failed (user rejection, RPC error, revert)
    #[error("{message}")]
    TransactionFailed { kind: FailureKind, message: String },

    // ============ Withdrawal Errors ============
    /// User has no deposit in the current pool
    #[error("nothing to withdraw from the current pool")]
    NothingToWithdraw,

    /// Pool holds no deposits, so shares cannot be priced
    #[error("pool has no deposits")]
    EmptyPool,

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ Configuration Errors ============
    /// Configuration could not be loaded or is inconsistent
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

/// Reasons an amount string is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountErrorReason {
    /// Leading minus sign
    Negative,
    /// Not a decimal number
    NotNumeric,
    /// Does not fit in 256 bits once scaled
    TooLarge,
}

impl core::fmt::Display for AmountErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Self::Negative => "negative amounts are not allowed",
            Self::NotNumeric => "not a decimal number",
            Self::TooLarge => "amount too large",
        };
        f.write_str(text)
    }
}

/// How a submitted transaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Wallet signature prompt dismissed
    UserRejected,
    /// Node or wallet transport error
    Rpc,
    /// Executed and reverted on-chain
    Reverted,
}

/// Error taxonomy as presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected locally, never reached the network
    InputRejected,
    /// User dismissed the wallet prompt
    UserDeclined,
    /// Submission or polling call failed
    Network,
    /// Contract-side validation rejected the call
    ContractRevert,
    /// Programming or configuration error
    Internal,
}

impl DonutError {
    /// Build a transaction failure, falling back to the generic message
    pub fn transaction_failed(kind: FailureKind, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| crate::constants::ui::GENERIC_FAILURE.to_string());
        Self::TransactionFailed { kind, message }
    }

    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyAmount => "E001_EMPTY_AMOUNT",
            Self::InvalidAmount { .. } => "E002_INVALID_AMOUNT",
            Self::ZeroAmount => "E003_ZERO_AMOUNT",
            Self::InsufficientBalance { .. } => "E004_INSUFFICIENT_BALANCE",
            Self::FlowInProgress { .. } => "E010_FLOW_IN_PROGRESS",
            Self::InvalidStateTransition { .. } => "E011_INVALID_STATE",
            Self::UnknownSubmission => "E012_UNKNOWN_SUBMISSION",
            Self::TransactionFailed { kind, .. } => match kind {
                FailureKind::UserRejected => "E020_USER_REJECTED",
                FailureKind::Rpc => "E021_RPC_FAILURE",
                FailureKind::Reverted => "E022_REVERTED",
            },
            Self::NothingToWithdraw => "E030_NOTHING_TO_WITHDRAW",
            Self::EmptyPool => "E031_EMPTY_POOL",
            Self::Overflow => "E040_OVERFLOW",
            Self::DivisionByZero => "E041_DIV_ZERO",
            Self::Config { .. } => "E050_CONFIG",
        }
    }

    /// Classify into the user-facing taxonomy
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::EmptyAmount
            | Self::InvalidAmount { .. }
            | Self::ZeroAmount
            | Self::InsufficientBalance { .. }
            | Self::FlowInProgress { .. }
            | Self::NothingToWithdraw
            | Self::EmptyPool => ErrorKind::InputRejected,
            Self::TransactionFailed { kind, .. } => match kind {
                FailureKind::UserRejected => ErrorKind::UserDeclined,
                FailureKind::Rpc => ErrorKind::Network,
                FailureKind::Reverted => ErrorKind::ContractRevert,
            },
            Self::InvalidStateTransition { .. }
            | Self::UnknownSubmission
            | Self::Overflow
            | Self::DivisionByZero
            | Self::Config { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.error_kind(),
            ErrorKind::InputRejected | ErrorKind::UserDeclined | ErrorKind::Network
        )
    }
}
