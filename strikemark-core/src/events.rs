//! Events emitted for the external indexer.
//!
//! Every state change the surrounding systems need to mirror is pushed to an
//! ordered outbox as part of the operation that caused it, and drained by the
//! host after the operation commits. A rejected operation emits nothing.

use serde::{Deserialize, Serialize};

use crate::market::{AccountId, MarketId, Side};
use crate::position::PositionId;

/// A committed state change, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    MarketCreated {
        market: MarketId,
        description: String,
        feed_id: String,
        threshold: i64,
        expected_exponent: i32,
        expires_at: u64,
    },
    StakeRecorded {
        market: MarketId,
        position: PositionId,
        staker: AccountId,
        side: Side,
        amount: u64,
        pool_below: u64,
        pool_above: u64,
    },
    MarketResolved {
        market: MarketId,
        price: i64,
        winning_side: Side,
        total_pool: u128,
    },
    RewardClaimed {
        market: MarketId,
        position: PositionId,
        owner: AccountId,
        net_payout: u64,
    },
    FeeAccrued {
        market: MarketId,
        amount: u64,
        treasury_total: u64,
    },
    PositionTransferred {
        position: PositionId,
        from: AccountId,
        to: AccountId,
    },
    TreasuryWithdrawn {
        to: AccountId,
        amount: u64,
        remaining: u64,
    },
}
