//! Application Constants
//!
//! All magic numbers and configuration defaults for the Donuettes mini app.
//! Poll intervals mirror what the original web client used against Base.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Base mainnet
//! - Default (no feature) - Base Sepolia
//!
//! ```toml
//! # For mainnet builds:
//! donuette-common = { path = "...", features = ["mainnet"] }
//! ```

/// Token Metadata
pub mod token {
    /// Token symbol
    pub const SYMBOL: &str = "DONUT";
    /// Decimal places (ERC-20 standard)
    pub const DECIMALS: u8 = 18;
    /// One whole token in base units (1 DONUT = 10^18)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Chain identifiers
pub mod chain {
    /// Base mainnet
    pub const BASE: u64 = 8453;

    /// Base Sepolia testnet
    pub const BASE_SEPOLIA: u64 = 84532;

    /// Chain the build targets
    #[cfg(feature = "mainnet")]
    pub const DEFAULT_CHAIN_ID: u64 = BASE;
    #[cfg(not(feature = "mainnet"))]
    pub const DEFAULT_CHAIN_ID: u64 = BASE_SEPOLIA;
}

/// Polling intervals (milliseconds)
pub mod polling {
    /// Transaction / batch status poll
    pub const STATUS_MS: u64 = 1_000;
}

/// Precision constants
pub mod precision {
    /// Basis points denominator (10_000 = 100%)
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Digits shown after the decimal point for token amounts
    pub const DISPLAY_DECIMALS: usize = 2;
}

/// Deposit form defaults
pub mod ui {
    /// Quick-pick deposit amounts, in whole tokens
    pub const QUICK_AMOUNTS: [u32; 4] = [5, 10, 25, 50];

    /// Minimum deposit shown before the contract value has been read
    pub const FALLBACK_MIN_DEPOSIT: &str = "100";

    /// Shown when a failed transaction carries no message
    pub const GENERIC_FAILURE: &str = "Transaction failed";
}
