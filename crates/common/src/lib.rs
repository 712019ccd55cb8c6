//! Donuettes Common Library
//!
//! Shared types, constants, and utilities for the Donuettes co-mining
//! mini app. Everything in this crate is pure and synchronous: it never
//! talks to a node or a wallet. The `donuette-comining` crate binds this
//! logic to its external collaborators.
//!
//! ## What Lives Here
//!
//! - **Amounts**: decimal input parsing into 18-decimal fixed point, display formatting
//! - **Call Encoding**: `approve`, `deposit` and `withdrawFromCurrentPool` calldata
//! - **Deposit Flow**: the approve-then-deposit state machine as an explicit transition table
//! - **Pool Math**: auction progress, ready-to-mine status, withdraw share conversion
//! - **Events**: a log of everything the flow did, for the UI and for debugging
//! - **Configuration**: pool addresses and poll intervals, injected at startup
//!
//! ## What Does Not
//!
//! Pool accounting, Dutch-auction pricing and reward distribution all live
//! in the on-chain contracts. This crate only reads their results and
//! encodes calls to them.

pub mod constants;
pub mod errors;
pub mod types;
pub mod amount;
pub mod math;
pub mod validation;
pub mod abi;
pub mod config;
pub mod events;
pub mod orchestrator;


// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use amount::{format_donut, parse_amount};
pub use config::AppConfig;
pub use events::{EventLog, EventType, FlowEvent};
pub use orchestrator::{
    DepositFlow, DepositRequest, FlowEffect, FlowInput, FlowState, SubmissionStage,
};
