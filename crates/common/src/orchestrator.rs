//! Deposit Flow
//!
//! Sequences a token approval and a pool deposit into one user action,
//! branching on what the wallet connector can do.
//!
//! The flow performs no I/O. It consumes [`FlowInput`]s (a submit click, a
//! wallet response, a polled status) and answers with [`FlowEffect`]s for
//! the caller to execute. Every transition is listed in [`DepositFlow::handle`].
//!
//! ```text
//! Sequential wallet, allowance too low:
//!   Idle -> AwaitingSignature(Approval) -> ApprovalPending
//!        -> AwaitingSignature(Deposit)  -> DepositPending -> Idle (amount cleared)
//!
//! Sequential wallet, allowance sufficient (or native pool):
//!   Idle -> AwaitingSignature(Deposit) -> DepositPending -> Idle
//!
//! Batching wallet:
//!   Idle -> AwaitingSignature(Batch) -> BatchPending -> Idle
//!
//! Any failure or wallet rejection returns to Idle and surfaces the error.
//! ```
//!
//! The deposit that follows a confirmed approval always uses the amount
//! captured when the flow started, never the current contents of the
//! amount field.

use crate::abi::{approve_call, deposit_call, native_deposit_call};
use crate::config::AppConfig;
use crate::errors::{DonutError, DonutResult, FailureKind};
use crate::events::{EventLog, FlowEvent};
use crate::types::{Address, Call, PoolAsset, SubmissionId, TokenAmount, TxStatus, WalletCapability};
use crate::validation::validate_deposit_input;

// ============ Flow Types ============

/// Which submission the wallet is being asked to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    /// `approve(pool, amount)` on the token
    Approval,
    /// `deposit(amount)` on the pool
    Deposit,
    /// approve + deposit as one atomic batch
    Batch,
}

/// Current position in the deposit flow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    /// Nothing in flight; the submit affordance is enabled
    #[default]
    Idle,
    /// Request handed to the wallet, waiting for a signature or rejection
    AwaitingSignature {
        stage: SubmissionStage,
        amount: TokenAmount,
    },
    /// Approval submitted, waiting for its receipt
    ApprovalPending {
        id: SubmissionId,
        amount: TokenAmount,
    },
    /// Deposit submitted, waiting for its receipt
    DepositPending {
        id: SubmissionId,
        amount: TokenAmount,
    },
    /// Batch submitted, waiting for its status
    BatchPending {
        id: SubmissionId,
        amount: TokenAmount,
    },
}

impl FlowState {
    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AwaitingSignature { stage: SubmissionStage::Approval, .. } => "AwaitingApprovalSignature",
            Self::AwaitingSignature { stage: SubmissionStage::Deposit, .. } => "AwaitingDepositSignature",
            Self::AwaitingSignature { stage: SubmissionStage::Batch, .. } => "AwaitingBatchSignature",
            Self::ApprovalPending { .. } => "ApprovalPending",
            Self::DepositPending { .. } => "DepositPending",
            Self::BatchPending { .. } => "BatchPending",
        }
    }

    /// Returns true if no submission is in flight
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Amount captured when the flow started
    pub fn amount(&self) -> Option<TokenAmount> {
        match self {
            Self::Idle => None,
            Self::AwaitingSignature { amount, .. }
            | Self::ApprovalPending { amount, .. }
            | Self::DepositPending { amount, .. }
            | Self::BatchPending { amount, .. } => Some(*amount),
        }
    }

    /// Submission currently being watched
    pub fn watched(&self) -> Option<&SubmissionId> {
        match self {
            Self::ApprovalPending { id, .. }
            | Self::DepositPending { id, .. }
            | Self::BatchPending { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Everything needed to plan a deposit, read fresh at submit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    /// Raw contents of the amount field
    pub input: String,
    /// Spendable balance of the deposit asset
    pub balance: TokenAmount,
    /// Current allowance of the pool over the user's tokens
    pub allowance: TokenAmount,
    /// What the connected wallet can submit
    pub capability: WalletCapability,
}

/// Inputs that drive the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowInput {
    /// User pressed deposit
    Submit(DepositRequest),
    /// Wallet accepted the pending request
    Submitted(SubmissionId),
    /// Wallet refused the pending request, or a status query failed
    SubmissionFailed {
        kind: FailureKind,
        message: Option<String>,
    },
    /// Status poll for a watched submission returned
    Resolved { id: SubmissionId, status: TxStatus },
}

impl FlowInput {
    fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "Submit",
            Self::Submitted(_) => "Submitted",
            Self::SubmissionFailed { .. } => "SubmissionFailed",
            Self::Resolved { .. } => "Resolved",
        }
    }
}

/// Work the caller must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEffect {
    /// Submit one call through the wallet; answer with `Submitted` or `SubmissionFailed`
    SendCall(Call),
    /// Submit an atomic batch; answer with `Submitted` or `SubmissionFailed`
    SendBatch(Vec<Call>),
    /// Poll the submission until terminal; answer with `Resolved`
    WatchStatus(SubmissionId),
    /// Reset the amount field
    ClearAmount,
    /// Re-read balance, allowance and pool details
    InvalidateReads,
    /// Show the error to the user
    Surface(DonutError),
}

// ============ Deposit Flow ============

/// The deposit state machine for one session
#[derive(Debug, Clone)]
pub struct DepositFlow {
    pool: Address,
    asset: PoolAsset,
    state: FlowState,
}

impl DepositFlow {
    /// Creates an idle flow for the configured pool
    pub fn new(config: &AppConfig) -> Self {
        Self {
            pool: config.pool,
            asset: config.asset,
            state: FlowState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Returns true while a submission is in flight
    pub fn is_busy(&self) -> bool {
        !self.state.is_idle()
    }

    /// Apply one input and return the effects to execute.
    ///
    /// | state               | input                 | next state          | effects                        |
    /// |---------------------|-----------------------|---------------------|--------------------------------|
    /// | Idle                | Submit (valid)        | AwaitingSignature   | SendCall / SendBatch           |
    /// | Idle                | Submit (invalid)      | Idle                | error, nothing sent            |
    /// | not Idle            | Submit                | unchanged           | `FlowInProgress` error         |
    /// | AwaitingSignature   | Submitted(id)         | *Pending(id)        | WatchStatus(id)                |
    /// | not Idle            | SubmissionFailed      | Idle                | Surface                        |
    /// | *Pending            | Resolved(Pending)     | unchanged           | none                           |
    /// | ApprovalPending     | Resolved(Success)     | AwaitingSignature   | SendCall(deposit)              |
    /// | Deposit/BatchPending| Resolved(Success)     | Idle                | ClearAmount, InvalidateReads   |
    /// | *Pending            | Resolved(Failure)     | Idle                | Surface                        |
    ///
    /// Any other combination is rejected and leaves the state unchanged.
    pub fn handle(&mut self, input: FlowInput, events: &mut EventLog) -> DonutResult<Vec<FlowEffect>> {
        let state = core::mem::take(&mut self.state);

        let (next, result) = match (state, input) {
            // 1. Start a new flow
            (FlowState::Idle, FlowInput::Submit(request)) => match self.plan(&request) {
                Ok((next, effects, needs_approval)) => {
                    events.emit(FlowEvent::DepositRequested {
                        amount: next.amount().unwrap_or_default(),
                        capability: request.capability,
                        needs_approval,
                    });
                    (next, Ok(effects))
                }
                Err(err) => (FlowState::Idle, Err(err)),
            },
            (state, FlowInput::Submit(_)) => {
                let err = DonutError::FlowInProgress { state: state.name() };
                (state, Err(err))
            }

            // 2. Wallet accepted the request
            (FlowState::AwaitingSignature { stage, amount }, FlowInput::Submitted(id)) => {
                let (next, event) = match stage {
                    SubmissionStage::Approval => (
                        FlowState::ApprovalPending { id: id.clone(), amount },
                        FlowEvent::ApprovalSubmitted { id: id.clone(), amount },
                    ),
                    SubmissionStage::Deposit => (
                        FlowState::DepositPending { id: id.clone(), amount },
                        FlowEvent::DepositSubmitted { id: id.clone(), amount },
                    ),
                    SubmissionStage::Batch => (
                        FlowState::BatchPending { id: id.clone(), amount },
                        FlowEvent::BatchSubmitted { id: id.clone(), amount },
                    ),
                };
                events.emit(event);
                (next, Ok(vec![FlowEffect::WatchStatus(id)]))
            }

            // 3. Wallet refused the request, or the node stopped answering
            (state, FlowInput::SubmissionFailed { kind, message }) if !state.is_idle() => {
                (FlowState::Idle, Ok(fail(kind, message, events)))
            }

            // 4. Status for the watched submission
            (state, FlowInput::Resolved { id, status }) if state.watched().is_some() => {
                if state.watched() != Some(&id) {
                    (state, Err(DonutError::UnknownSubmission))
                } else {
                    self.resolve(state, id, status, events)
                }
            }

            // 5. Everything else is a caller bug
            (state, input) => {
                let err = DonutError::InvalidStateTransition {
                    state: state.name(),
                    input: input.name(),
                };
                (state, Err(err))
            }
        };

        self.state = next;
        result
    }

    /// Decide which calls a valid request needs.
    ///
    /// Returns the next state, the effects and whether an approval is part
    /// of the plan.
    fn plan(&self, request: &DepositRequest) -> DonutResult<(FlowState, Vec<FlowEffect>, bool)> {
        let amount = validate_deposit_input(&request.input, request.balance)?;

        let token = match self.asset {
            PoolAsset::Native => {
                let call = native_deposit_call(self.pool, amount);
                let next = FlowState::AwaitingSignature { stage: SubmissionStage::Deposit, amount };
                return Ok((next, vec![FlowEffect::SendCall(call)], false));
            }
            PoolAsset::Token(token) => token,
        };

        if request.capability.supports_batching() {
            let calls = vec![
                approve_call(token, self.pool, amount),
                deposit_call(self.pool, amount),
            ];
            let next = FlowState::AwaitingSignature { stage: SubmissionStage::Batch, amount };
            return Ok((next, vec![FlowEffect::SendBatch(calls)], true));
        }

        if request.allowance >= amount {
            let next = FlowState::AwaitingSignature { stage: SubmissionStage::Deposit, amount };
            Ok((next, vec![FlowEffect::SendCall(deposit_call(self.pool, amount))], false))
        } else {
            let next = FlowState::AwaitingSignature { stage: SubmissionStage::Approval, amount };
            Ok((next, vec![FlowEffect::SendCall(approve_call(token, self.pool, amount))], true))
        }
    }

    fn resolve(
        &self,
        state: FlowState,
        id: SubmissionId,
        status: TxStatus,
        events: &mut EventLog,
    ) -> (FlowState, DonutResult<Vec<FlowEffect>>) {
        match (state, status) {
            (state, TxStatus::Pending) => (state, Ok(Vec::new())),

            (FlowState::ApprovalPending { amount, .. }, TxStatus::Success) => {
                events.emit(FlowEvent::ApprovalConfirmed { id });
                let next = FlowState::AwaitingSignature { stage: SubmissionStage::Deposit, amount };
                (next, Ok(vec![FlowEffect::SendCall(deposit_call(self.pool, amount))]))
            }

            (FlowState::DepositPending { amount, .. }, TxStatus::Success) => {
                events.emit(FlowEvent::DepositConfirmed { id, amount });
                (FlowState::Idle, Ok(confirmed(events)))
            }

            (FlowState::BatchPending { amount, .. }, TxStatus::Success) => {
                events.emit(FlowEvent::BatchConfirmed { id, amount });
                (FlowState::Idle, Ok(confirmed(events)))
            }

            (_, TxStatus::Failure { reason }) => {
                (FlowState::Idle, Ok(fail(FailureKind::Reverted, reason, events)))
            }

            (state, TxStatus::Success) => {
                let err = DonutError::InvalidStateTransition {
                    state: state.name(),
                    input: "Resolved",
                };
                (state, Err(err))
            }
        }
    }
}

fn confirmed(events: &mut EventLog) -> Vec<FlowEffect> {
    events.emit(FlowEvent::ReadsInvalidated);
    vec![FlowEffect::ClearAmount, FlowEffect::InvalidateReads]
}

fn fail(kind: FailureKind, message: Option<String>, events: &mut EventLog) -> Vec<FlowEffect> {
    let err = DonutError::transaction_failed(kind, message);
    events.emit(FlowEvent::FlowFailed {
        kind,
        message: err.to_string(),
    });
    vec![FlowEffect::Surface(err)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{decode_approve, decode_deposit};
    use crate::constants::token::ONE;
    use crate::events::EventType;
    use crate::types::{BatchId, TxHash, U256};
    use pretty_assertions::assert_eq;

    fn pool() -> Address {
        Address::repeat_byte(0xAA)
    }

    fn token() -> Address {
        Address::repeat_byte(0xBB)
    }

    fn tokens(n: u128) -> U256 {
        U256::from(n * ONE)
    }

    fn tx(byte: u8) -> SubmissionId {
        SubmissionId::Transaction(TxHash::repeat_byte(byte))
    }

    fn create_test_flow() -> DepositFlow {
        DepositFlow::new(&AppConfig::token_pool(pool(), token()))
    }

    fn request(input: &str, balance: U256, allowance: U256, capability: WalletCapability) -> FlowInput {
        FlowInput::Submit(DepositRequest {
            input: input.to_string(),
            balance,
            allowance,
            capability,
        })
    }

    fn single_call(effects: &[FlowEffect]) -> &Call {
        match effects {
            [FlowEffect::SendCall(call)] => call,
            other => panic!("expected one SendCall, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_input_sends_nothing() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        for input in ["", "0", "-3", "abc", "0.0"] {
            let result = flow.handle(
                request(input, tokens(50), U256::ZERO, WalletCapability::Sequential),
                &mut events,
            );
            assert!(result.is_err(), "{input:?} should be rejected");
            assert!(flow.state().is_idle());
        }
        assert!(events.is_empty());
    }

    #[test]
    fn test_insufficient_balance_sends_nothing() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        let result = flow.handle(
            request("10", tokens(5), U256::ZERO, WalletCapability::AtomicBatch),
            &mut events,
        );

        assert_eq!(
            result,
            Err(DonutError::InsufficientBalance {
                available: tokens(5),
                requested: tokens(10),
            })
        );
        assert!(flow.state().is_idle());
        assert!(events.is_empty());
    }

    #[test]
    fn test_batch_wallet_sends_single_batch() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        let effects = flow
            .handle(request("10", tokens(50), tokens(100), WalletCapability::AtomicBatch), &mut events)
            .unwrap();

        let calls = match effects.as_slice() {
            [FlowEffect::SendBatch(calls)] => calls,
            other => panic!("expected one SendBatch, got {other:?}"),
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(decode_approve(&calls[0]), Some((pool(), tokens(10))));
        assert_eq!(calls[0].to, token());
        assert_eq!(decode_deposit(&calls[1]), Some(tokens(10)));
        assert_eq!(calls[1].to, pool());
        assert_eq!(flow.state().name(), "AwaitingBatchSignature");
    }

    #[test]
    fn test_batch_confirmation_clears_amount() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();
        let id = SubmissionId::Batch(BatchId("0x01".into()));

        flow.handle(request("10", tokens(50), U256::ZERO, WalletCapability::AtomicBatch), &mut events)
            .unwrap();
        let effects = flow.handle(FlowInput::Submitted(id.clone()), &mut events).unwrap();
        assert_eq!(effects, vec![FlowEffect::WatchStatus(id.clone())]);

        let effects = flow
            .handle(FlowInput::Resolved { id, status: TxStatus::Success }, &mut events)
            .unwrap();
        assert_eq!(effects, vec![FlowEffect::ClearAmount, FlowEffect::InvalidateReads]);
        assert!(flow.state().is_idle());
        assert_eq!(
            events.types(),
            vec![
                EventType::DepositRequested,
                EventType::BatchSubmitted,
                EventType::BatchConfirmed,
                EventType::ReadsInvalidated,
            ]
        );
    }

    #[test]
    fn test_sufficient_allowance_skips_approval() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        let effects = flow
            .handle(request("10", tokens(50), tokens(20), WalletCapability::Sequential), &mut events)
            .unwrap();

        let call = single_call(&effects);
        assert_eq!(decode_deposit(call), Some(tokens(10)));
        assert_eq!(
            flow.state(),
            &FlowState::AwaitingSignature { stage: SubmissionStage::Deposit, amount: tokens(10) }
        );
    }

    #[test]
    fn test_exact_allowance_skips_approval() {
        let mut flow = create_test_flow();
        let effects = flow
            .handle(
                request("10", tokens(50), tokens(10), WalletCapability::Sequential),
                &mut EventLog::new(),
            )
            .unwrap();
        assert!(decode_deposit(single_call(&effects)).is_some());
    }

    #[test]
    fn test_low_allowance_approves_then_deposits() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        // 1. Approval first
        let effects = flow
            .handle(request("10", tokens(50), U256::ZERO, WalletCapability::Sequential), &mut events)
            .unwrap();
        assert_eq!(decode_approve(single_call(&effects)), Some((pool(), tokens(10))));

        // 2. Approval accepted, watch it
        let effects = flow.handle(FlowInput::Submitted(tx(1)), &mut events).unwrap();
        assert_eq!(effects, vec![FlowEffect::WatchStatus(tx(1))]);

        // 3. Still pending: nothing happens
        let effects = flow
            .handle(FlowInput::Resolved { id: tx(1), status: TxStatus::Pending }, &mut events)
            .unwrap();
        assert!(effects.is_empty());
        assert_eq!(flow.state().name(), "ApprovalPending");

        // 4. Approval confirmed: deposit for the same amount
        let effects = flow
            .handle(FlowInput::Resolved { id: tx(1), status: TxStatus::Success }, &mut events)
            .unwrap();
        assert_eq!(decode_deposit(single_call(&effects)), Some(tokens(10)));

        // 5. Deposit confirmed
        flow.handle(FlowInput::Submitted(tx(2)), &mut events).unwrap();
        let effects = flow
            .handle(FlowInput::Resolved { id: tx(2), status: TxStatus::Success }, &mut events)
            .unwrap();
        assert_eq!(effects, vec![FlowEffect::ClearAmount, FlowEffect::InvalidateReads]);
        assert!(flow.state().is_idle());
    }

    #[test]
    fn test_failed_approval_never_deposits() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        flow.handle(request("10", tokens(50), U256::ZERO, WalletCapability::Sequential), &mut events)
            .unwrap();
        flow.handle(FlowInput::Submitted(tx(1)), &mut events).unwrap();

        let effects = flow
            .handle(
                FlowInput::Resolved {
                    id: tx(1),
                    status: TxStatus::Failure { reason: Some("out of gas".into()) },
                },
                &mut events,
            )
            .unwrap();

        assert_eq!(
            effects,
            vec![FlowEffect::Surface(DonutError::TransactionFailed {
                kind: FailureKind::Reverted,
                message: "out of gas".into(),
            })]
        );
        assert!(flow.state().is_idle());
        assert!(events.filter_by_type(EventType::DepositSubmitted).is_empty());
    }

    #[test]
    fn test_user_rejection_returns_to_idle() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        flow.handle(request("10", tokens(50), U256::ZERO, WalletCapability::Sequential), &mut events)
            .unwrap();
        let effects = flow
            .handle(
                FlowInput::SubmissionFailed {
                    kind: FailureKind::UserRejected,
                    message: Some("User rejected the request.".into()),
                },
                &mut events,
            )
            .unwrap();

        match effects.as_slice() {
            [FlowEffect::Surface(err)] => assert!(err.is_recoverable()),
            other => panic!("expected Surface, got {other:?}"),
        }
        assert!(flow.state().is_idle());
    }

    #[test]
    fn test_status_query_failure_returns_to_idle() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        flow.handle(request("10", tokens(50), tokens(10), WalletCapability::Sequential), &mut events)
            .unwrap();
        flow.handle(FlowInput::Submitted(tx(1)), &mut events).unwrap();

        let effects = flow
            .handle(
                FlowInput::SubmissionFailed { kind: FailureKind::Rpc, message: None },
                &mut events,
            )
            .unwrap();

        assert_eq!(
            effects,
            vec![FlowEffect::Surface(DonutError::TransactionFailed {
                kind: FailureKind::Rpc,
                message: "Transaction failed".into(),
            })]
        );
        assert!(flow.state().is_idle());
    }

    #[test]
    fn test_second_submit_rejected_while_busy() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        flow.handle(request("10", tokens(50), U256::ZERO, WalletCapability::Sequential), &mut events)
            .unwrap();
        flow.handle(FlowInput::Submitted(tx(1)), &mut events).unwrap();

        let result = flow.handle(
            request("5", tokens(50), U256::ZERO, WalletCapability::Sequential),
            &mut events,
        );
        assert_eq!(result, Err(DonutError::FlowInProgress { state: "ApprovalPending" }));
        assert_eq!(flow.state().amount(), Some(tokens(10)));
    }

    #[test]
    fn test_unknown_submission_rejected() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        flow.handle(request("10", tokens(50), tokens(10), WalletCapability::Sequential), &mut events)
            .unwrap();
        flow.handle(FlowInput::Submitted(tx(1)), &mut events).unwrap();

        let result = flow.handle(
            FlowInput::Resolved { id: tx(9), status: TxStatus::Success },
            &mut events,
        );
        assert_eq!(result, Err(DonutError::UnknownSubmission));
        assert_eq!(flow.state().watched(), Some(&tx(1)));
    }

    #[test]
    fn test_out_of_order_inputs_rejected() {
        let mut flow = create_test_flow();
        let mut events = EventLog::new();

        let result = flow.handle(FlowInput::Submitted(tx(1)), &mut events);
        assert_eq!(
            result,
            Err(DonutError::InvalidStateTransition { state: "Idle", input: "Submitted" })
        );

        let result = flow.handle(
            FlowInput::Resolved { id: tx(1), status: TxStatus::Success },
            &mut events,
        );
        assert!(matches!(result, Err(DonutError::InvalidStateTransition { .. })));
        assert!(flow.state().is_idle());
    }

    #[test]
    fn test_native_pool_attaches_value() {
        let mut flow = DepositFlow::new(&AppConfig::native_pool(pool()));
        let mut events = EventLog::new();

        let effects = flow
            .handle(request("0.5", tokens(1), U256::ZERO, WalletCapability::AtomicBatch), &mut events)
            .unwrap();

        let call = single_call(&effects);
        assert_eq!(call.to, pool());
        assert_eq!(call.value, U256::from(ONE / 2));
        assert_eq!(
            events.events()[0],
            FlowEvent::DepositRequested {
                amount: U256::from(ONE / 2),
                capability: WalletCapability::AtomicBatch,
                needs_approval: false,
            }
        );
    }
}
