//! Flow Events
//!
//! Every step the deposit and withdraw flows take is recorded as an event.
//! The UI renders status lines from them ("Waiting for approval
//! confirmation...", "Deposit successful! Refreshing..."), and the session
//! keeps them for debugging.

use serde::{Deserialize, Serialize};

use crate::errors::FailureKind;
use crate::types::{SubmissionId, TokenAmount, U256, WalletCapability};

/// Event types for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    // Deposit Events (0x01 - 0x1F)
    DepositRequested = 0x01,
    ApprovalSubmitted = 0x02,
    ApprovalConfirmed = 0x03,
    DepositSubmitted = 0x04,
    DepositConfirmed = 0x05,
    BatchSubmitted = 0x06,
    BatchConfirmed = 0x07,
    FlowFailed = 0x08,
    AmountDiverged = 0x09,

    // Withdrawal Events (0x20 - 0x2F)
    WithdrawalSubmitted = 0x20,
    WithdrawalConfirmed = 0x21,

    // Session Events (0x40 - 0x4F)
    ReadsInvalidated = 0x40,
}

/// Main event enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    // ============ Deposit Events ============

    /// A deposit passed input validation and was planned
    DepositRequested {
        amount: TokenAmount,
        capability: WalletCapability,
        needs_approval: bool,
    },

    /// Approval transaction accepted by the wallet
    ApprovalSubmitted { id: SubmissionId, amount: TokenAmount },

    /// Approval confirmed on-chain
    ApprovalConfirmed { id: SubmissionId },

    /// Deposit transaction accepted by the wallet
    DepositSubmitted { id: SubmissionId, amount: TokenAmount },

    /// Deposit confirmed on-chain
    DepositConfirmed { id: SubmissionId, amount: TokenAmount },

    /// Approve + deposit batch accepted by the wallet
    BatchSubmitted { id: SubmissionId, amount: TokenAmount },

    /// Approve + deposit batch confirmed as a unit
    BatchConfirmed { id: SubmissionId, amount: TokenAmount },

    /// The flow aborted and returned to idle
    FlowFailed { kind: FailureKind, message: String },

    /// The amount field changed while an approval was pending; the
    /// deposit still uses the captured amount
    AmountDiverged { captured: TokenAmount, displayed: String },

    // ============ Withdrawal Events ============

    /// Withdrawal transaction accepted by the wallet
    WithdrawalSubmitted { id: SubmissionId, shares: U256 },

    /// Withdrawal confirmed on-chain
    WithdrawalConfirmed { id: SubmissionId, shares: U256 },

    // ============ Session Events ============

    /// Balance, allowance and pool reads were discarded
    ReadsInvalidated,
}

impl FlowEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::DepositRequested { .. } => EventType::DepositRequested,
            Self::ApprovalSubmitted { .. } => EventType::ApprovalSubmitted,
            Self::ApprovalConfirmed { .. } => EventType::ApprovalConfirmed,
            Self::DepositSubmitted { .. } => EventType::DepositSubmitted,
            Self::DepositConfirmed { .. } => EventType::DepositConfirmed,
            Self::BatchSubmitted { .. } => EventType::BatchSubmitted,
            Self::BatchConfirmed { .. } => EventType::BatchConfirmed,
            Self::FlowFailed { .. } => EventType::FlowFailed,
            Self::AmountDiverged { .. } => EventType::AmountDiverged,
            Self::WithdrawalSubmitted { .. } => EventType::WithdrawalSubmitted,
            Self::WithdrawalConfirmed { .. } => EventType::WithdrawalConfirmed,
            Self::ReadsInvalidated => EventType::ReadsInvalidated,
        }
    }

    /// Submission the event refers to, if any
    pub fn submission(&self) -> Option<&SubmissionId> {
        match self {
            Self::ApprovalSubmitted { id, .. }
            | Self::ApprovalConfirmed { id }
            | Self::DepositSubmitted { id, .. }
            | Self::DepositConfirmed { id, .. }
            | Self::BatchSubmitted { id, .. }
            | Self::BatchConfirmed { id, .. }
            | Self::WithdrawalSubmitted { id, .. }
            | Self::WithdrawalConfirmed { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during a session
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<FlowEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: FlowEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[FlowEvent] {
        &self.events
    }

    /// Most recent event
    pub fn last(&self) -> Option<&FlowEvent> {
        self.events.last()
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<FlowEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&FlowEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Event types in emission order
    pub fn types(&self) -> Vec<EventType> {
        self.events.iter().map(FlowEvent::event_type).collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
