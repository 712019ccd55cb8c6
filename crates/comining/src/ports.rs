//! Collaborator Ports
//!
//! The session talks to the outside world through three traits. Production
//! code backs them with an RPC client and a wallet SDK; tests back them with
//! in-memory mocks.

use async_trait::async_trait;
use donuette_common::{
    Address, BatchId, Call, DonutError, FailureKind, PoolDetails, PoolId, SubmissionId,
    TokenAmount, TxHash, TxStatus, UserPosition, WalletCapability,
};
use thiserror::Error;

/// Failure reported by a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {}", .message.as_deref().unwrap_or("no details"))]
pub struct ConnectorError {
    /// How the request failed
    pub kind: FailureKind,
    /// Message from the wallet or node, if any
    pub message: Option<String>,
}

impl ConnectorError {
    /// The user dismissed the wallet prompt
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::UserRejected,
            message: Some(message.into()),
        }
    }

    /// Transport or node failure
    pub fn rpc(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rpc,
            message: Some(message.into()),
        }
    }

    /// Execution reverted during simulation or submission
    pub fn reverted(message: Option<String>) -> Self {
        Self {
            kind: FailureKind::Reverted,
            message,
        }
    }
}

impl From<ConnectorError> for DonutError {
    fn from(err: ConnectorError) -> Self {
        DonutError::transaction_failed(err.kind, err.message)
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Read-only chain queries
#[async_trait]
pub trait PoolReader: Send + Sync {
    /// Id of the pool currently accepting deposits
    async fn current_pool_id(&self) -> ConnectorResult<PoolId>;

    /// Totals for one pool
    async fn pool_details(&self, pool_id: PoolId) -> ConnectorResult<PoolDetails>;

    /// Current Dutch-auction price of the next mining slot
    async fn current_price(&self) -> ConnectorResult<TokenAmount>;

    /// A user's stake in one pool
    async fn position(&self, pool_id: PoolId, user: Address) -> ConnectorResult<UserPosition>;

    /// Contract minimum deposit
    async fn min_deposit(&self) -> ConnectorResult<TokenAmount>;

    /// ERC-20 balance of `owner`
    async fn token_balance(&self, token: Address, owner: Address) -> ConnectorResult<TokenAmount>;

    /// ERC-20 allowance granted by `owner` to `spender`
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> ConnectorResult<TokenAmount>;

    /// Native asset balance of `owner`
    async fn native_balance(&self, owner: Address) -> ConnectorResult<TokenAmount>;
}

/// Write submissions through the user's wallet
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Connected account
    fn account(&self) -> Address;

    /// Whether the connector accepts atomic multi-call batches
    async fn capability(&self) -> ConnectorResult<WalletCapability>;

    /// Submit one call; resolves once the user has signed
    async fn send_call(&self, call: Call) -> ConnectorResult<TxHash>;

    /// Submit an ordered batch executed as a unit
    async fn send_calls(&self, calls: Vec<Call>) -> ConnectorResult<BatchId>;
}

/// Execution status lookups
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Receipt status for a transaction, or aggregate status for a batch
    async fn status(&self, id: &SubmissionId) -> ConnectorResult<TxStatus>;
}
