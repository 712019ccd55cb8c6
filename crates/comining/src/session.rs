//! Mining Session
//!
//! One connected user on one pool. The session owns the collaborators and
//! executes the effects the deposit flow asks for, one at a time:
//!
//! 1. Reject unusable input before touching the chain
//! 2. Read balance and allowance fresh
//! 3. Feed `Submit` to the flow
//! 4. Send calls, poll statuses, feed results back
//! 5. Stop when the flow has nothing left to do
//!
//! If the future driving a deposit is dropped, the flow keeps its state and
//! [`MiningSession::resume`] picks the watched submission back up.
//!
//! Withdrawals bypass the flow entirely: one call, one poll.

use std::collections::VecDeque;
use std::sync::Arc;

use donuette_common::abi::withdraw_call;
use donuette_common::check;
use donuette_common::math::shares_for_withdrawal;
use donuette_common::validation::{
    require_non_zero, validate_deposit_input, validate_withdraw_input,
};
use donuette_common::{
    parse_amount, Address, AppConfig, DepositFlow, DepositRequest, DonutError, DonutResult,
    EventLog, FailureKind, FlowEffect, FlowEvent, FlowInput, FlowState, PoolAsset, SubmissionId,
    SubmissionStage, TokenAmount, TxStatus, WalletCapability, U256,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::ReadCache;
use crate::poller::poll_until_terminal;
use crate::ports::{ConnectorError, PoolReader, StatusSource, WalletConnector};
use crate::snapshot::PoolSnapshot;

// ============ Amount Field ============

/// The deposit amount input, shared between the session and the UI.
///
/// Clones refer to the same field, so the UI can keep editing while a
/// deposit is in flight.
#[derive(Debug, Clone)]
pub struct AmountField {
    value: Arc<watch::Sender<String>>,
}

impl AmountField {
    pub fn new() -> Self {
        let (value, _) = watch::channel(String::new());
        Self { value: Arc::new(value) }
    }

    /// Current contents
    pub fn get(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn set(&self, input: impl Into<String>) {
        self.value.send_replace(input.into());
    }

    pub fn clear(&self) {
        self.value.send_replace(String::new());
    }
}

impl Default for AmountField {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Outcomes ============

/// Which path a confirmed deposit took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    /// Approve + deposit confirmed as one batch
    Batched { id: SubmissionId, amount: TokenAmount },
    /// Existing allowance covered the amount; deposit only
    Deposited { id: SubmissionId, amount: TokenAmount },
    /// Approval confirmed, then the deposit
    ApprovedThenDeposited {
        approval: SubmissionId,
        deposit: SubmissionId,
        amount: TokenAmount,
    },
    /// Native-asset deposit with value attached
    Native { id: SubmissionId, amount: TokenAmount },
}

impl DepositOutcome {
    pub fn amount(&self) -> TokenAmount {
        match self {
            Self::Batched { amount, .. }
            | Self::Deposited { amount, .. }
            | Self::ApprovedThenDeposited { amount, .. }
            | Self::Native { amount, .. } => *amount,
        }
    }
}

/// A confirmed withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub id: SubmissionId,
    /// Amount the user asked for
    pub amount: TokenAmount,
    /// Shares burned for it
    pub shares: U256,
}

// ============ Session ============

pub struct MiningSession<R, W, S> {
    config: AppConfig,
    reader: R,
    wallet: W,
    status: S,
    account: Address,
    capability: WalletCapability,
    amount: AmountField,
    flow: DepositFlow,
    flow_status: watch::Sender<FlowState>,
    /// Submissions of the current deposit, in order
    submissions: Vec<(SubmissionStage, SubmissionId)>,
    cache: ReadCache,
    events: EventLog,
}

impl<R, W, S> MiningSession<R, W, S>
where
    R: PoolReader,
    W: WalletConnector,
    S: StatusSource,
{
    /// Validate the config and read the wallet capability once.
    ///
    /// A connector that cannot report capabilities is treated as
    /// sequential-only.
    pub async fn connect(config: AppConfig, reader: R, wallet: W, status: S) -> DonutResult<Self> {
        config.validate()?;

        let account = wallet.account();
        let capability = match wallet.capability().await {
            Ok(capability) => capability,
            Err(err) => {
                warn!(%err, "capability query failed; submitting calls one at a time");
                WalletCapability::Sequential
            }
        };

        info!(
            %account,
            ?capability,
            chain_id = config.chain_id,
            pool = %config.pool,
            "session connected"
        );

        Ok(Self {
            flow: DepositFlow::new(&config),
            flow_status: watch::channel(FlowState::Idle).0,
            submissions: Vec::new(),
            config,
            reader,
            wallet,
            status,
            account,
            capability,
            amount: AmountField::new(),
            cache: ReadCache::new(),
            events: EventLog::new(),
        })
    }

    // ============ Accessors ============

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn capability(&self) -> WalletCapability {
        self.capability
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn status_source(&self) -> &S {
        &self.status
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    pub fn flow_state(&self) -> &FlowState {
        self.flow.state()
    }

    /// Follow the flow state from outside the session, e.g. to disable the
    /// deposit button while a deposit is being driven elsewhere
    pub fn flow_status(&self) -> watch::Receiver<FlowState> {
        self.flow_status.subscribe()
    }

    /// Handle to the amount input
    pub fn amount_field(&self) -> AmountField {
        self.amount.clone()
    }

    pub fn set_amount(&self, input: impl Into<String>) {
        self.amount.set(input);
    }

    pub fn amount(&self) -> String {
        self.amount.get()
    }

    /// Whether the deposit button should be enabled, judged against the
    /// last balance read. False until a balance has been read and while a
    /// deposit is in flight or interrupted.
    pub fn can_deposit(&self) -> bool {
        match self.cache.balance() {
            Some(balance) => {
                !self.flow.is_busy() && validate_deposit_input(&self.amount.get(), balance).is_ok()
            }
            None => false,
        }
    }

    /// Whether depositing the current amount starts with an approval.
    ///
    /// `None` when the amount does not parse or no allowance has been read.
    pub fn needs_approval(&self) -> Option<bool> {
        match self.config.asset {
            PoolAsset::Native => Some(false),
            PoolAsset::Token(_) if self.capability.supports_batching() => Some(true),
            PoolAsset::Token(_) => {
                let amount = parse_amount(&self.amount.get()).ok()?;
                self.cache.allowance().map(|allowance| allowance < amount)
            }
        }
    }

    // ============ Reads ============

    async fn read_balance(&mut self) -> DonutResult<TokenAmount> {
        let balance = match self.config.asset {
            PoolAsset::Token(token) => self.reader.token_balance(token, self.account).await?,
            PoolAsset::Native => self.reader.native_balance(self.account).await?,
        };
        self.cache.record_balance(balance);
        Ok(balance)
    }

    async fn read_allowance(&mut self) -> DonutResult<TokenAmount> {
        match self.config.asset {
            PoolAsset::Token(token) => {
                let allowance = self
                    .reader
                    .allowance(token, self.account, self.config.pool)
                    .await?;
                self.cache.record_allowance(allowance);
                Ok(allowance)
            }
            PoolAsset::Native => Ok(U256::ZERO),
        }
    }

    /// Read everything the pool view renders
    pub async fn snapshot(&mut self) -> DonutResult<PoolSnapshot> {
        let pool_id = self.reader.current_pool_id().await?;
        let details = self.reader.pool_details(pool_id).await?;
        let price = self.reader.current_price().await?;
        let position = self.reader.position(pool_id, self.account).await?;
        let min_deposit = match self.reader.min_deposit().await {
            Ok(min) => Some(min),
            Err(err) => {
                debug!(%err, "min deposit unavailable");
                None
            }
        };
        let balance = self.read_balance().await?;
        self.read_allowance().await?;

        Ok(PoolSnapshot {
            pool_id,
            details,
            price,
            position,
            min_deposit,
            balance,
        })
    }

    // ============ Deposit ============

    /// Run one deposit from the current amount field to confirmation.
    ///
    /// Returns the path taken. Empty, zero and malformed amounts are
    /// rejected before any chain read; an amount above the balance is
    /// rejected before anything is sent. Transaction failures are returned
    /// after the flow is back to idle.
    pub async fn deposit(&mut self) -> DonutResult<DepositOutcome> {
        check!(
            !self.flow.is_busy(),
            DonutError::FlowInProgress { state: self.flow.state().name() }
        );
        let input = self.amount.get();
        require_non_zero(parse_amount(&input)?)?;

        let balance = self.read_balance().await?;
        let allowance = self.read_allowance().await?;

        let request = DepositRequest {
            input,
            balance,
            allowance,
            capability: self.capability,
        };
        self.submissions.clear();
        let effects = self.apply(FlowInput::Submit(request))?;
        info!(
            amount = %self.flow.state().amount().unwrap_or_default(),
            capability = ?self.capability,
            "deposit started"
        );

        self.drive(effects).await
    }

    /// Pick up a deposit whose driving future was dropped.
    ///
    /// Returns `Ok(None)` when nothing is in flight. A watched submission is
    /// polled again and the flow driven to completion, including the
    /// deposit that follows a confirmed approval. A request that was still
    /// waiting on the wallet cannot be traced, so that flow is aborted.
    pub async fn resume(&mut self) -> DonutResult<Option<DepositOutcome>> {
        let watched = self.flow.state().watched().cloned();
        let unsigned = matches!(self.flow.state(), FlowState::AwaitingSignature { .. });

        let effects = match watched {
            Some(id) => {
                info!(%id, state = self.flow.state().name(), "resuming deposit");
                vec![FlowEffect::WatchStatus(id)]
            }
            None if unsigned => {
                warn!(state = self.flow.state().name(), "wallet request interrupted");
                self.apply(FlowInput::SubmissionFailed {
                    kind: FailureKind::Rpc,
                    message: Some("wallet request interrupted".to_string()),
                })?
            }
            None => return Ok(None),
        };

        self.drive(effects).await.map(Some)
    }

    /// Feed one input to the flow and publish the resulting state
    fn apply(&mut self, input: FlowInput) -> DonutResult<Vec<FlowEffect>> {
        let result = self.flow.handle(input, &mut self.events);
        self.flow_status.send_replace(self.flow.state().clone());
        result
    }

    /// Execute effects until the flow has nothing left to do
    async fn drive(&mut self, effects: Vec<FlowEffect>) -> DonutResult<DepositOutcome> {
        let amount = self.flow.state().amount().unwrap_or_default();
        let mut queue: VecDeque<FlowEffect> = effects.into();
        let mut surfaced = None;

        while let Some(effect) = queue.pop_front() {
            let input = match effect {
                FlowEffect::SendCall(call) => {
                    debug!(to = %call.to, value = %call.value, "sending call");
                    let result = self.wallet.send_call(call).await;
                    Some(self.submitted(result.map(SubmissionId::Transaction)))
                }
                FlowEffect::SendBatch(calls) => {
                    debug!(calls = calls.len(), "sending batch");
                    let result = self.wallet.send_calls(calls).await;
                    Some(self.submitted(result.map(SubmissionId::Batch)))
                }
                FlowEffect::WatchStatus(id) => {
                    let every = self.config.status_poll_interval();
                    match poll_until_terminal(&self.status, &id, every).await {
                        Ok(status) => Some(FlowInput::Resolved { id, status }),
                        Err(err) => {
                            warn!(%id, %err, "status query failed");
                            Some(FlowInput::SubmissionFailed {
                                kind: err.kind,
                                message: err.message,
                            })
                        }
                    }
                }
                FlowEffect::ClearAmount => {
                    self.amount.clear();
                    None
                }
                FlowEffect::InvalidateReads => {
                    self.cache.invalidate();
                    debug!("reads invalidated");
                    None
                }
                FlowEffect::Surface(err) => {
                    warn!(code = err.code(), %err, "deposit failed");
                    surfaced = Some(err);
                    None
                }
            };

            if let Some(input) = input {
                let approving = matches!(self.flow.state(), FlowState::ApprovalPending { .. });
                let produced = self.apply(input)?;
                if approving && self.awaiting_stage() == Some(SubmissionStage::Deposit) {
                    info!(%amount, "approval confirmed; depositing");
                    self.check_amount_divergence(amount);
                }
                queue.extend(produced);
            }
        }

        if let Some(err) = surfaced {
            return Err(err);
        }

        let outcome = match (self.config.asset, self.submissions.as_slice()) {
            (PoolAsset::Native, [(_, id)]) => DepositOutcome::Native { id: id.clone(), amount },
            (_, [(SubmissionStage::Batch, id)]) => DepositOutcome::Batched { id: id.clone(), amount },
            (_, [(SubmissionStage::Deposit, id)]) => DepositOutcome::Deposited { id: id.clone(), amount },
            (_, [(SubmissionStage::Approval, approval), (SubmissionStage::Deposit, deposit)]) => {
                DepositOutcome::ApprovedThenDeposited {
                    approval: approval.clone(),
                    deposit: deposit.clone(),
                    amount,
                }
            }
            _ => {
                return Err(DonutError::InvalidStateTransition {
                    state: self.flow.state().name(),
                    input: "Resolved",
                })
            }
        };

        info!(?outcome, "deposit confirmed");
        Ok(outcome)
    }

    fn awaiting_stage(&self) -> Option<SubmissionStage> {
        match self.flow.state() {
            FlowState::AwaitingSignature { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Turn a wallet response into the flow input, remembering what was sent
    fn submitted(&mut self, result: Result<SubmissionId, ConnectorError>) -> FlowInput {
        match result {
            Ok(id) => {
                if let Some(stage) = self.awaiting_stage() {
                    info!(%id, ?stage, "submitted");
                    self.submissions.push((stage, id.clone()));
                }
                FlowInput::Submitted(id)
            }
            Err(err) => {
                warn!(%err, "wallet refused submission");
                FlowInput::SubmissionFailed {
                    kind: err.kind,
                    message: err.message,
                }
            }
        }
    }

    /// The deposit after an approval always uses the approved amount. If
    /// the field now says something else, record it.
    fn check_amount_divergence(&mut self, captured: TokenAmount) {
        let displayed = self.amount.get();
        if parse_amount(&displayed).ok() == Some(captured) {
            return;
        }
        warn!(
            %captured,
            %displayed,
            "amount field changed while approval was pending; depositing the approved amount"
        );
        self.events.emit(FlowEvent::AmountDiverged { captured, displayed });
    }

    // ============ Withdraw ============

    /// Withdraw `input` tokens from the current pool.
    ///
    /// The amount is converted to shares against the latest pool totals and
    /// sent as a single call. No approval is involved.
    pub async fn withdraw(&mut self, input: &str) -> DonutResult<WithdrawOutcome> {
        let amount = validate_withdraw_input(input)?;

        let pool_id = self.reader.current_pool_id().await?;
        let details = self.reader.pool_details(pool_id).await?;
        let position = self.reader.position(pool_id, self.account).await?;
        check!(position.has_deposit(), DonutError::NothingToWithdraw);

        let shares = shares_for_withdrawal(amount, details.total_shares, details.total_deposited)?;
        check!(!shares.is_zero(), DonutError::ZeroAmount);

        info!(%pool_id, %amount, %shares, "withdrawing");
        let call = withdraw_call(self.config.pool, shares);
        let hash = match self.wallet.send_call(call).await {
            Ok(hash) => hash,
            Err(err) => return Err(self.withdraw_failed(err)),
        };

        let id = SubmissionId::Transaction(hash);
        self.events.emit(FlowEvent::WithdrawalSubmitted { id: id.clone(), shares });

        let every = self.config.status_poll_interval();
        let status = match poll_until_terminal(&self.status, &id, every).await {
            Ok(status) => status,
            Err(err) => return Err(self.withdraw_failed(err)),
        };

        match status {
            TxStatus::Success => {
                self.events.emit(FlowEvent::WithdrawalConfirmed { id: id.clone(), shares });
                self.cache.invalidate();
                self.events.emit(FlowEvent::ReadsInvalidated);
                info!(%id, %shares, "withdrawal confirmed");
                Ok(WithdrawOutcome { id, amount, shares })
            }
            TxStatus::Failure { reason } => Err(self.withdraw_failed(ConnectorError::reverted(reason))),
            TxStatus::Pending => Err(DonutError::InvalidStateTransition {
                state: "WithdrawalPending",
                input: "Resolved",
            }),
        }
    }

    fn withdraw_failed(&mut self, err: ConnectorError) -> DonutError {
        let kind = err.kind;
        let err = DonutError::from(err);
        warn!(code = err.code(), %err, "withdrawal failed");
        self.events.emit(FlowEvent::FlowFailed {
            kind,
            message: err.to_string(),
        });
        err
    }
}
