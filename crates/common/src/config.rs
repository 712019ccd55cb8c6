//! Application Configuration
//!
//! Contract addresses and poll intervals, loaded once at startup and passed
//! explicitly to whatever issues calls. Nothing reads configuration from
//! global state.
//!
//! ```toml
//! chain_id = 8453
//! pool = "0x1111111111111111111111111111111111111111"
//! status_poll_ms = 1000
//!
//! [asset]
//! kind = "token"
//! address = "0x2222222222222222222222222222222222222222"
//! ```

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{chain, polling};
use crate::errors::{DonutError, DonutResult};
use crate::types::{Address, PoolAsset};

/// Process-wide immutable configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chain the pool is deployed on
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Co-mining pool contract
    pub pool: Address,
    /// Deposit asset of the pool
    pub asset: PoolAsset,
    /// Interval between transaction status queries
    #[serde(default = "default_status_poll_ms")]
    pub status_poll_ms: u64,
}

fn default_chain_id() -> u64 {
    chain::DEFAULT_CHAIN_ID
}

fn default_status_poll_ms() -> u64 {
    polling::STATUS_MS
}

impl AppConfig {
    /// Creates a config for a token-funded pool with default intervals
    pub fn token_pool(pool: Address, token: Address) -> Self {
        Self {
            chain_id: chain::DEFAULT_CHAIN_ID,
            pool,
            asset: PoolAsset::Token(token),
            status_poll_ms: polling::STATUS_MS,
        }
    }

    /// Creates a config for a native-asset pool with default intervals
    pub fn native_pool(pool: Address) -> Self {
        Self {
            chain_id: chain::DEFAULT_CHAIN_ID,
            pool,
            asset: PoolAsset::Native,
            status_poll_ms: polling::STATUS_MS,
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> DonutResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| DonutError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could never submit a valid call
    pub fn validate(&self) -> DonutResult<()> {
        if self.pool == Address::ZERO {
            return Err(config_error("pool address is zero"));
        }
        if let PoolAsset::Token(token) = self.asset {
            if token == Address::ZERO {
                return Err(config_error("token address is zero"));
            }
            if token == self.pool {
                return Err(config_error("token and pool addresses are identical"));
            }
        }
        if self.status_poll_ms == 0 {
            return Err(config_error("status poll interval is zero"));
        }
        if self.chain_id == 0 {
            return Err(config_error("chain id is zero"));
        }
        Ok(())
    }

    /// Status poll interval as a duration
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_ms)
    }
}

fn config_error(reason: &str) -> DonutError {
    DonutError::Config { reason: reason.to_string() }
}
