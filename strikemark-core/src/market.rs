//! Market state machine and per-side stake pools.
//!
//! A [`Market`] is a single binary proposition: will the configured feed's
//! price be at or above a fixed-point threshold when the market expires?
//! Stake accumulates into one pool per [`Side`] while the market is open;
//! resolution freezes both pools and fixes the winning side exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};
use crate::oracle::FeedId;

/// Unique, monotonically assigned market identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MarketId(pub u64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque principal identifier supplied by the host.
///
/// The engine never interprets it; equality is the only operation it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One of the two mutually exclusive outcomes a stake can back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Price finishes under the threshold ("bearish").
    Below,
    /// Price finishes at or over the threshold ("bullish").
    Above,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Below => Side::Above,
            Side::Above => Side::Below,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Below => f.write_str("below"),
            Side::Above => f.write_str("above"),
        }
    }
}

/// Lifecycle status of a market. Transitions `Open -> Resolved` exactly once
/// and never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Open,
    Resolved,
}

/// A single binary proposition with a deadline and an oracle-determined
/// resolution.
///
/// Markets are kept forever once created, including after resolution, so
/// that settled history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    /// Human-readable proposition.
    pub description: String,
    /// Price feed this market settles against.
    pub feed_id: FeedId,
    /// Strike threshold, unscaled fixed-point at the feed's exponent.
    pub threshold: i64,
    /// Feed exponent the market was configured against.
    pub expected_exponent: i32,
    /// Unix timestamp after which staking closes and resolution opens.
    pub expires_at: u64,
    pub status: MarketStatus,
    /// Cumulative stake backing [`Side::Below`].
    pub pool_below: u64,
    /// Cumulative stake backing [`Side::Above`].
    pub pool_above: u64,
    /// Winning side, set once at resolution.
    pub winning_side: Option<Side>,
    /// Feed price the market resolved at.
    pub resolution_price: Option<i64>,
    /// Fee rate frozen when the market resolved, in basis points.
    pub resolved_fee_bps: Option<u16>,
    pub created_at: u64,
}

impl Market {
    pub fn new(
        id: MarketId,
        description: String,
        feed_id: FeedId,
        threshold: i64,
        expected_exponent: i32,
        expires_at: u64,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            description,
            feed_id,
            threshold,
            expected_exponent,
            expires_at,
            status: MarketStatus::Open,
            pool_below: 0,
            pool_above: 0,
            winning_side: None,
            resolution_price: None,
            resolved_fee_bps: None,
            created_at,
        }
    }

    /// Cumulative stake backing the given side.
    pub fn pool(&self, side: Side) -> u64 {
        match side {
            Side::Below => self.pool_below,
            Side::Above => self.pool_above,
        }
    }

    /// Total stake across both sides.
    pub fn total_pool(&self) -> u128 {
        self.pool_below as u128 + self.pool_above as u128
    }

    /// Whether the staking window has closed.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Add stake to one side's pool.
    pub(crate) fn credit_stake(&mut self, side: Side, amount: u64) -> Result<()> {
        let pool = match side {
            Side::Below => &mut self.pool_below,
            Side::Above => &mut self.pool_above,
        };
        *pool = pool
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Perform the one-time `Open -> Resolved` transition, fixing the winning
    /// side, the resolution price and the fee rate claims will settle at.
    pub(crate) fn resolve(&mut self, winning_side: Side, price: i64, fee_bps: u16) -> Result<()> {
        if self.status == MarketStatus::Resolved {
            return Err(EngineError::MarketAlreadyResolved(self.id));
        }
        self.status = MarketStatus::Resolved;
        self.winning_side = Some(winning_side);
        self.resolution_price = Some(price);
        self.resolved_fee_bps = Some(fee_bps);
        Ok(())
    }

    /// Display-only odds multiple for one side: total pool over that side's
    /// pool. Never used in settlement arithmetic.
    pub fn odds(&self, side: Side) -> f64 {
        let side_pool = self.pool(side) as f64;
        if side_pool == 0.0 {
            return 1.0;
        }
        (self.pool_below as f64 + self.pool_above as f64) / side_pool
    }
}
