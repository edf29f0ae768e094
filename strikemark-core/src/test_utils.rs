//! Common test utilities for strikemark-core tests.
//!
//! Provides the shared market setup used across module tests: a standard
//! feed, threshold and expiry, plus builders for an engine on a manual
//! clock and a market staked on both sides.

use crate::clock::ManualClock;
use crate::engine::{EngineConfig, MarketEngine};
use crate::market::{AccountId, MarketId, Side};
use crate::oracle::{FeedId, PriceUpdate};
use crate::position::PositionId;

/// Pyth-style BTC/USD feed identifier used across tests.
pub const TEST_FEED: &str = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43";
/// 2000.00000000 at 8 decimal places.
pub const TEST_THRESHOLD: i64 = 200_000_000_000;
pub const TEST_EXPONENT: i32 = -8;
pub const TEST_EXPIRY: u64 = 1_700_000_000;

pub fn test_feed_id() -> FeedId {
    FeedId::new(TEST_FEED).unwrap()
}

pub fn admin() -> AccountId {
    AccountId::from("admin")
}

/// Engine an hour before the standard expiry: 2% fee, minimum stake 100,
/// 300s staleness bound. The returned clock handle drives the engine's time.
pub fn test_engine() -> (MarketEngine, ManualClock) {
    let clock = ManualClock::new(TEST_EXPIRY - 3_600);
    let config = EngineConfig {
        admin: admin(),
        fee_bps: 200,
        min_stake: 100,
        max_staleness_secs: 300,
    };
    let engine = MarketEngine::with_clock(config, Box::new(clock.clone())).unwrap();
    (engine, clock)
}

/// Open the standard market and stake it three ways: alice 100 below,
/// bob 300 below, carol 200 above.
pub fn staked_three_way_market(
    engine: &mut MarketEngine,
) -> (MarketId, PositionId, PositionId, PositionId) {
    let market = engine
        .open_market(
            "Will BTC close above $2000?",
            TEST_FEED,
            TEST_THRESHOLD,
            TEST_EXPONENT,
            TEST_EXPIRY,
        )
        .unwrap();
    let below_small = engine
        .record_stake(market, &AccountId::from("alice"), Side::Below, 100, 100)
        .unwrap()
        .position;
    let below_large = engine
        .record_stake(market, &AccountId::from("bob"), Side::Below, 300, 300)
        .unwrap()
        .position;
    let above = engine
        .record_stake(market, &AccountId::from("carol"), Side::Above, 200, 200)
        .unwrap()
        .position;
    (market, below_small, below_large, above)
}

/// The staked market, expired and resolved above the threshold.
pub fn resolved_three_way_market(
    engine: &mut MarketEngine,
    clock: &ManualClock,
) -> (MarketId, PositionId, PositionId, PositionId) {
    let ids = staked_three_way_market(engine);
    clock.set(TEST_EXPIRY + 30);
    engine
        .resolve_market(ids.0, &update_at(210_000_000_000, TEST_EXPIRY + 20))
        .unwrap();
    ids
}

/// Price update at the standard exponent with a valid round.
pub fn update_at(price: i64, publish_time: u64) -> PriceUpdate {
    PriceUpdate {
        price,
        exponent: TEST_EXPONENT,
        publish_time,
        round: Some(7),
    }
}
