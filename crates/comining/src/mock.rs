//! In-memory collaborators for tests. Every submission and status query is
//! recorded so tests can assert on exactly what reached the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use donuette_common::constants::token::ONE;
use donuette_common::{
    Address, BatchId, Call, PoolDetails, PoolId, SubmissionId, TokenAmount, TxHash, TxStatus,
    UserPosition, WalletCapability, U256,
};

use crate::ports::{ConnectorError, ConnectorResult, PoolReader, StatusSource, WalletConnector};
use crate::session::AmountField;

pub(crate) fn tokens(n: u128) -> U256 {
    U256::from(n * ONE)
}

pub(crate) fn pool() -> Address {
    Address::repeat_byte(0xAA)
}

pub(crate) fn token() -> Address {
    Address::repeat_byte(0xBB)
}

pub(crate) fn user() -> Address {
    Address::repeat_byte(0x01)
}

// ============ Reader ============

pub(crate) struct MockReader {
    pub pool_id: PoolId,
    pub details: PoolDetails,
    pub price: TokenAmount,
    pub position: UserPosition,
    /// `None` makes the query fail
    pub min_deposit: Option<TokenAmount>,
    pub token_balance: TokenAmount,
    pub allowance: TokenAmount,
    pub native_balance: TokenAmount,
    /// Every query fails as if the node were unreachable
    pub offline: bool,
    pub(crate) reads: AtomicUsize,
}

impl MockReader {
    /// Number of queries made so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn touch(&self) -> ConnectorResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(ConnectorError::rpc("node down"));
        }
        Ok(())
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self {
            pool_id: U256::from(1u64),
            details: PoolDetails {
                total_deposited: tokens(200),
                total_shares: tokens(100),
                participants: U256::from(4u64),
            },
            price: tokens(1000),
            position: UserPosition {
                deposited: tokens(50),
                shares: tokens(25),
                share_bps: U256::from(2_500u64),
            },
            min_deposit: Some(tokens(1)),
            token_balance: tokens(50),
            allowance: U256::ZERO,
            native_balance: tokens(2),
            offline: false,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PoolReader for MockReader {
    async fn current_pool_id(&self) -> ConnectorResult<PoolId> {
        self.touch()?;
        Ok(self.pool_id)
    }

    async fn pool_details(&self, _pool_id: PoolId) -> ConnectorResult<PoolDetails> {
        self.touch()?;
        Ok(self.details)
    }

    async fn current_price(&self) -> ConnectorResult<TokenAmount> {
        self.touch()?;
        Ok(self.price)
    }

    async fn position(&self, _pool_id: PoolId, _user: Address) -> ConnectorResult<UserPosition> {
        self.touch()?;
        Ok(self.position)
    }

    async fn min_deposit(&self) -> ConnectorResult<TokenAmount> {
        self.touch()?;
        self.min_deposit
            .ok_or_else(|| ConnectorError::rpc("execution reverted"))
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> ConnectorResult<TokenAmount> {
        self.touch()?;
        Ok(self.token_balance)
    }

    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> ConnectorResult<TokenAmount> {
        self.touch()?;
        Ok(self.allowance)
    }

    async fn native_balance(&self, _owner: Address) -> ConnectorResult<TokenAmount> {
        self.touch()?;
        Ok(self.native_balance)
    }
}

// ============ Wallet ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Single(Call),
    Batch(Vec<Call>),
}

pub(crate) struct MockWallet {
    capability: ConnectorResult<WalletCapability>,
    sent: Mutex<Vec<Sent>>,
    /// Outcome override per submission, in order; `None` accepts
    failures: Mutex<VecDeque<Option<ConnectorError>>>,
    /// Never answer, like a wallet prompt left open
    stalled: AtomicBool,
}

impl MockWallet {
    pub fn new(capability: WalletCapability) -> Self {
        Self {
            capability: Ok(capability),
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            stalled: AtomicBool::new(false),
        }
    }

    pub fn without_capabilities() -> Self {
        Self {
            capability: Err(ConnectorError::rpc("wallet_getCapabilities not supported")),
            ..Self::new(WalletCapability::Sequential)
        }
    }

    /// Script the outcome of upcoming submissions
    pub fn script(self, failures: Vec<Option<ConnectorError>>) -> Self {
        *self.failures.lock().unwrap() = failures.into();
        self
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    async fn record(&self, sent: Sent) -> ConnectorResult<u8> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(Some(err)) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut log = self.sent.lock().unwrap();
        log.push(sent);
        Ok(log.len() as u8)
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    fn account(&self) -> Address {
        user()
    }

    async fn capability(&self) -> ConnectorResult<WalletCapability> {
        self.capability.clone()
    }

    async fn send_call(&self, call: Call) -> ConnectorResult<TxHash> {
        let n = self.record(Sent::Single(call)).await?;
        Ok(TxHash::repeat_byte(n))
    }

    async fn send_calls(&self, calls: Vec<Call>) -> ConnectorResult<BatchId> {
        let n = self.record(Sent::Batch(calls)).await?;
        Ok(BatchId(format!("0x{n:02x}")))
    }
}

// ============ Status ============

pub(crate) struct MockStatus {
    script: Mutex<VecDeque<ConnectorResult<TxStatus>>>,
    fallback: Mutex<TxStatus>,
    queries: Mutex<Vec<SubmissionId>>,
    edit: Mutex<Option<(AmountField, String)>>,
}

impl MockStatus {
    /// Answers from `script` in order, then confirms
    pub fn scripted(script: Vec<ConnectorResult<TxStatus>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(TxStatus::Success),
            queries: Mutex::new(Vec::new()),
            edit: Mutex::new(None),
        }
    }

    pub fn always(status: TxStatus) -> Self {
        Self {
            fallback: Mutex::new(status),
            ..Self::scripted(Vec::new())
        }
    }

    pub fn confirming() -> Self {
        Self::always(TxStatus::Success)
    }

    /// Overwrite the amount field on the first query, as a user typing
    /// while a submission is pending would
    pub fn edit_on_first_query(self, field: AmountField, value: &str) -> Self {
        *self.edit.lock().unwrap() = Some((field, value.to_string()));
        self
    }

    /// Answer every later query with `status`
    pub fn settle(&self, status: TxStatus) {
        *self.fallback.lock().unwrap() = status;
    }

    pub fn queries(&self) -> Vec<SubmissionId> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSource for MockStatus {
    async fn status(&self, id: &SubmissionId) -> ConnectorResult<TxStatus> {
        self.queries.lock().unwrap().push(id.clone());
        if let Some((field, value)) = self.edit.lock().unwrap().take() {
            field.set(value);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.lock().unwrap().clone()))
    }
}
