//! Error types for strikemark-core

use thiserror::Error;

use crate::market::{AccountId, MarketId};
use crate::position::PositionId;
use crate::vault::VaultError;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error types for settlement-engine operations.
///
/// Every rejected operation surfaces one of these kinds so that external
/// tooling can tell "retry later" (e.g. [`EngineError::PriceIsStale`]) from
/// "this will never succeed" (e.g. [`EngineError::MarketAlreadyResolved`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Market id is unknown to the engine.
    #[error("market {0} not found")]
    MarketNotFound(MarketId),

    /// Position id is unknown to the registry.
    #[error("position {0} not found")]
    PositionNotFound(PositionId),

    /// Staking window has closed for this market.
    #[error("market {market} expired at {expires_at} (now {now})")]
    MarketExpired {
        market: MarketId,
        expires_at: u64,
        now: u64,
    },

    /// Resolution attempted before the market's expiry.
    #[error("market {market} does not expire until {expires_at} (now {now})")]
    MarketNotExpired {
        market: MarketId,
        expires_at: u64,
        now: u64,
    },

    /// The market already went through its one-time resolution.
    #[error("market {0} already resolved")]
    MarketAlreadyResolved(MarketId),

    /// Claim attempted against a market that is still open.
    #[error("market {0} not resolved")]
    MarketNotResolved(MarketId),

    /// A zero amount where a positive one is required.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Stake smaller than the configured minimum.
    #[error("stake of {sent} below the minimum of {required}")]
    StakeBelowMinimum { sent: u64, required: u64 },

    /// Declared stake and the value actually transferred do not reconcile.
    #[error("declared stake {declared} does not match transferred value {transferred}")]
    ValueTransferMismatch { declared: u64, transferred: u64 },

    /// No oracle configuration registered for the market.
    #[error("no oracle registered for market {0}")]
    OracleNotRegistered(MarketId),

    /// The feed's exponent drifted from the one the market was opened with.
    #[error("unexpected price exponent: expected {expected}, got {actual}")]
    UnexpectedPriceExponent { expected: i32, actual: i32 },

    /// Non-positive price reported by the feed.
    #[error("invalid price {0}")]
    InvalidPrice(i64),

    /// Price update claims a publish time ahead of the engine clock.
    #[error("price published at {publish_time} is ahead of now ({now})")]
    PriceFromFuture { publish_time: u64, now: u64 },

    /// Price update older than the staleness bound.
    #[error(
        "price is stale: last updated at {last_updated_at}, now {now}, max staleness {max_staleness}s"
    )]
    PriceIsStale {
        last_updated_at: u64,
        now: u64,
        max_staleness: u64,
    },

    /// Zero or otherwise malformed aggregation round id.
    #[error("invalid oracle round id")]
    InvalidRound,

    /// Aggregation round older than the latest one observed for the feed.
    #[error("stale oracle round {got}, latest known is {latest}")]
    StaleRound { latest: u64, got: u64 },

    /// Position was already settled exactly once.
    #[error("position {0} already claimed")]
    AlreadyClaimed(PositionId),

    /// Claim on a position that backed the losing side.
    #[error("position {0} is not on the winning side")]
    NotWinningPosition(PositionId),

    /// Caller does not own the position.
    #[error("{caller} does not own position {position}")]
    NotPositionOwner {
        position: PositionId,
        caller: AccountId,
    },

    /// The custodian refused the payout; the claim was rolled back.
    #[error("payout transfer failed: {0}")]
    PayoutTransferFailed(#[from] VaultError),

    /// A computed reward of zero signals a misconfiguration, not a payout.
    #[error("computed reward for position {0} is zero")]
    ZeroRewardAmount(PositionId),

    /// Caller is not the administrative principal.
    #[error("{0} is not authorized")]
    Unauthorized(AccountId),

    /// Withdrawal larger than the accrued fee total.
    #[error("treasury holds {available}, cannot withdraw {requested}")]
    InsufficientTreasury { requested: u64, available: u64 },

    /// Market-creation parameters failed validation.
    #[error("invalid market: {0}")]
    InvalidMarket(String),

    /// Feed identifier is not 32 bytes of hex.
    #[error("invalid feed id: {0}")]
    InvalidFeedId(String),

    /// Fee outside the 0..=10000 basis-point range.
    #[error("fee of {0} basis points exceeds 10000")]
    InvalidFeeBasisPoints(u16),

    /// Engine-level configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}
