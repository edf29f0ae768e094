//! # Strikemark Core
//!
//! Settlement engine for oracle-resolved binary prediction markets.
//!
//! A market is a single question about an external price feed: will the
//! price be at or above a fixed-point threshold when the market expires?
//! Participants stake on either side while the market is open; after
//! expiry, anyone may submit a validated price update to resolve it, and
//! winning receipts claim a proportional share of the losing pool minus a
//! protocol fee.
//!
//! ## Features
//!
//! - **Market Lifecycle**: open markets on a feed, threshold and expiry;
//!   one-time oracle-driven resolution
//! - **Stake Ledger**: per-side pool accounting with exact value
//!   reconciliation and minimum-stake enforcement
//! - **Oracle Validation**: exponent, freshness and round checks gate every
//!   resolution; rejected data leaves the market retryable
//! - **Reward Distribution**: integer payout arithmetic that never pays out
//!   more than the pools hold, with every receipt settled exactly once
//!
//! The engine assumes a host that applies operations strictly one at a
//! time; every public operation either fully commits or leaves no trace.
//!
//! ## Example
//!
//! ```rust
//! use strikemark_core::{AccountId, EngineConfig, MarketEngine, Side};
//!
//! let mut engine = MarketEngine::new(EngineConfig::new(AccountId::from("admin")))?;
//!
//! let market = engine.open_market(
//!     "Will BTC close above $2000?",
//!     "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43",
//!     200_000_000_000, // 2000.00000000 at 8 decimals
//!     -8,
//!     4_102_444_800, // expiry
//! )?;
//!
//! let receipt = engine.record_stake(market, &AccountId::from("alice"), Side::Above, 500, 500)?;
//! assert_eq!(receipt.pool_above, 500);
//! Ok::<(), strikemark_core::EngineError>(())
//! ```

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod market;
pub mod oracle;
pub mod payout;
pub mod position;
pub mod utils;
pub mod vault;

#[cfg(test)]
pub(crate) mod test_utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineConfig, MarketEngine, Resolution, StakeReceipt};
pub use error::{EngineError, Result};
pub use events::EngineEvent;
pub use market::{AccountId, Market, MarketId, MarketStatus, Side};
pub use oracle::{FeedId, OracleConfig, PriceUpdate};
pub use payout::Payout;
pub use position::{Position, PositionId};
pub use vault::{InMemoryVault, Vault, VaultError};

/// Smallest stake the engine accepts unless configured otherwise.
pub const DEFAULT_MIN_STAKE: u64 = 100;

/// Default protocol fee in basis points (2%).
pub const DEFAULT_FEE_BPS: u16 = 200;

/// Default bound on the age of an acceptable price update, in seconds.
pub const DEFAULT_MAX_STALENESS_SECS: u64 = 300;

/// Longest market description accepted, in bytes.
pub const MAX_DESCRIPTION_LEN: usize = 256;
