//! Donuettes Co-Mining Session
//!
//! Binds the pure deposit flow from `donuette-common` to its external
//! collaborators: a chain reader, a wallet connector and a transaction
//! status source.
//!
//! ## Modules
//!
//! - `ports`: async traits for the three collaborators
//! - `poller`: fixed-interval status polling until a terminal state
//! - `cache`: last-read balance, allowance and pool details
//! - `snapshot`: pool read model for display
//! - `session`: one connected user; deposit and withdraw entry points
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = AppConfig::from_toml_str(&source)?;
//! let mut session = MiningSession::connect(config, reader, wallet, status).await?;
//!
//! session.amount_field().set("10");
//! let outcome = session.deposit().await?;
//! ```

pub mod cache;
pub mod poller;
pub mod ports;
pub mod session;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod mock;

pub use cache::ReadCache;
pub use poller::poll_until_terminal;
pub use ports::{ConnectorError, ConnectorResult, PoolReader, StatusSource, WalletConnector};
pub use session::{AmountField, DepositOutcome, MiningSession, WithdrawOutcome};
pub use snapshot::PoolSnapshot;
