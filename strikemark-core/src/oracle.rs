//! Price-feed validation and the resolution decision.
//!
//! Resolution is permissionless: any party may submit a price update, so
//! authorization is replaced by validation. The checks here are the only
//! gate between external feed data and a market's one-time settlement, and
//! a rejected update must leave the market open so resolution can be
//! retried with fresh data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{EngineError, Result};
use crate::market::{MarketId, Side};

/// Identifier of an external price feed: 32 bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(String);

impl FeedId {
    /// Parse and validate a feed identifier.
    pub fn new(hex_id: &str) -> Result<Self> {
        let bytes =
            hex::decode(hex_id).map_err(|_| EngineError::InvalidFeedId(hex_id.to_string()))?;
        if bytes.len() != 32 {
            return Err(EngineError::InvalidFeedId(hex_id.to_string()));
        }
        Ok(Self(hex_id.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point-in-time price report from the host's oracle integration.
///
/// The engine does not care what wire format carried the update; the host
/// decodes its chosen integration's blob into these fields and the engine
/// validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Unscaled fixed-point price.
    pub price: i64,
    /// Decimal exponent of `price`, e.g. -8 for 8 decimal places.
    pub exponent: i32,
    /// Unix timestamp at which the source published this price.
    pub publish_time: u64,
    /// Aggregation round / sequence number, if the source has one.
    pub round: Option<u64>,
}

/// Per-market oracle parameters.
///
/// Created with the market and never mutated afterwards; only the engine-wide
/// staleness override set by the administrator can change the effective
/// bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub feed_id: FeedId,
    /// Strike threshold at the feed's scale.
    pub threshold: i64,
    /// Exponent the feed is expected to publish at. A mismatch means the
    /// feed's format drifted and the update cannot be trusted.
    pub expected_exponent: i32,
    /// Maximum acceptable age of a price update, in seconds.
    pub max_staleness_secs: u64,
    pub registered: bool,
}

/// Holds each market's oracle configuration and the per-feed round watermark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleRegistry {
    configs: HashMap<MarketId, OracleConfig>,
    /// Highest aggregation round observed per feed, across all markets
    /// settling on that feed.
    latest_rounds: HashMap<FeedId, u64>,
    /// Engine-wide staleness override set by the administrator.
    staleness_override: Option<u64>,
}

impl OracleRegistry {
    pub fn register(&mut self, market: MarketId, config: OracleConfig) {
        self.configs.insert(market, config);
    }

    pub fn config(&self, market: MarketId) -> Option<&OracleConfig> {
        self.configs.get(&market)
    }

    /// Set the engine-wide staleness bound, overriding per-market bounds.
    pub fn set_staleness_override(&mut self, secs: u64) {
        self.staleness_override = Some(secs);
    }

    /// Effective staleness bound for a market's config.
    pub fn effective_staleness(&self, config: &OracleConfig) -> u64 {
        self.staleness_override.unwrap_or(config.max_staleness_secs)
    }

    /// Latest aggregation round observed for a feed, zero if none yet.
    pub fn latest_round(&self, feed: &FeedId) -> u64 {
        self.latest_rounds.get(feed).copied().unwrap_or(0)
    }

    /// Record the round a successful resolution settled on.
    pub fn record_round(&mut self, feed: &FeedId, round: u64) {
        let latest = self.latest_rounds.entry(feed.clone()).or_insert(0);
        if round > *latest {
            *latest = round;
        }
    }

    /// Run the full validation pipeline over a price update for a market.
    ///
    /// Checks, in order: registration, exponent, price sign, publish time
    /// not in the future, staleness, round id. Returns the market's config
    /// on success so the caller can read the threshold and feed id.
    ///
    /// Because resolution only happens at or after expiry and the update
    /// must be within `max_staleness` of now, a valid update's publish time
    /// always falls inside `[expiry - max_staleness, now]`.
    pub fn validate(
        &self,
        market: MarketId,
        update: &PriceUpdate,
        now: u64,
    ) -> Result<&OracleConfig> {
        let config = self
            .configs
            .get(&market)
            .filter(|c| c.registered)
            .ok_or(EngineError::OracleNotRegistered(market))?;

        if update.exponent != config.expected_exponent {
            return Err(EngineError::UnexpectedPriceExponent {
                expected: config.expected_exponent,
                actual: update.exponent,
            });
        }
        if update.price <= 0 {
            return Err(EngineError::InvalidPrice(update.price));
        }
        if update.publish_time > now {
            return Err(EngineError::PriceFromFuture {
                publish_time: update.publish_time,
                now,
            });
        }
        let max_staleness = self.effective_staleness(config);
        let age = now - update.publish_time;
        if age > max_staleness {
            return Err(EngineError::PriceIsStale {
                last_updated_at: update.publish_time,
                now,
                max_staleness,
            });
        }
        if let Some(round) = update.round {
            if round == 0 {
                return Err(EngineError::InvalidRound);
            }
            let latest = self.latest_round(&config.feed_id);
            if round < latest {
                return Err(EngineError::StaleRound {
                    latest,
                    got: round,
                });
            }
        }
        Ok(config)
    }
}

/// Decide the winning side for a resolution price.
///
/// Above ("bullish") wins iff `price >= threshold`. Both values are unscaled
/// integers at the same fixed-point scale; the comparison never goes through
/// floating point.
pub fn winning_side(price: i64, threshold: i64) -> Side {
    if price >= threshold {
        Side::Above
    } else {
        Side::Below
    }
}
