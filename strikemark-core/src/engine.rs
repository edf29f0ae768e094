//! The settlement engine: market lifecycle, stake ledger, oracle-driven
//! resolution and reward distribution behind one sequential surface.
//!
//! Host contract: operations are applied strictly one at a time, and each
//! call either fully commits or leaves the engine untouched. Every
//! validation runs before the first write, and the one fallible external
//! effect, the payout credit, also happens before any write, so a custodian
//! failure rolls the whole operation back by construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, Result};
use crate::events::EngineEvent;
use crate::market::{AccountId, Market, MarketId, MarketStatus, Side};
use crate::oracle::{self, FeedId, OracleConfig, OracleRegistry, PriceUpdate};
use crate::payout;
use crate::position::{Position, PositionId, PositionRegistry};
use crate::vault::Vault;
use crate::{
    DEFAULT_FEE_BPS, DEFAULT_MAX_STALENESS_SECS, DEFAULT_MIN_STAKE, MAX_DESCRIPTION_LEN,
};

/// Engine-wide configuration, fixed at construction except where an
/// administrative operation explicitly changes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The single administrative principal.
    pub admin: AccountId,
    /// Protocol fee in basis points, taken from winning-side payouts.
    pub fee_bps: u16,
    /// Smallest stake a market accepts.
    pub min_stake: u64,
    /// Default per-market staleness bound for oracle data, in seconds.
    pub max_staleness_secs: u64,
}

impl EngineConfig {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            fee_bps: DEFAULT_FEE_BPS,
            min_stake: DEFAULT_MIN_STAKE,
            max_staleness_secs: DEFAULT_MAX_STALENESS_SECS,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.fee_bps > 10_000 {
            return Err(EngineError::InvalidFeeBasisPoints(self.fee_bps));
        }
        if self.min_stake == 0 {
            return Err(EngineError::InvalidConfig(
                "minimum stake must be positive".to_string(),
            ));
        }
        if self.max_staleness_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "staleness bound must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a successful stake recording: the issued receipt plus the
/// market's updated totals, so hosts can show live odds without a second
/// query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeReceipt {
    pub position: PositionId,
    pub pool_below: u64,
    pub pool_above: u64,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub winning_side: Side,
    pub price: i64,
}

fn default_clock() -> Box<dyn Clock> {
    Box::new(SystemClock)
}

/// The settlement engine. One instance owns every market, every position and
/// the fee treasury.
#[derive(Serialize, Deserialize)]
pub struct MarketEngine {
    config: EngineConfig,
    markets: BTreeMap<MarketId, Market>,
    next_market_id: u64,
    positions: PositionRegistry,
    oracle: OracleRegistry,
    /// Running total of collected fees. Purely additive outside of
    /// administrative withdrawal.
    treasury: u64,
    /// Ordered events awaiting the host's indexer.
    events: Vec<EngineEvent>,
    #[serde(skip, default = "default_clock")]
    clock: Box<dyn Clock>,
}

impl MarketEngine {
    /// Engine on wall-clock time.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, default_clock())
    }

    /// Engine on a host-supplied clock.
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            markets: BTreeMap::new(),
            next_market_id: 1,
            positions: PositionRegistry::new(),
            oracle: OracleRegistry::default(),
            treasury: 0,
            events: Vec::new(),
            clock,
        })
    }

    fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Open a new market on a price feed and strike threshold.
    /// Permissionless.
    pub fn open_market(
        &mut self,
        description: &str,
        feed_id: &str,
        threshold: i64,
        expected_exponent: i32,
        expires_at: u64,
    ) -> Result<MarketId> {
        let now = self.now();
        if description.trim().is_empty() {
            return Err(EngineError::InvalidMarket(
                "description must not be empty".to_string(),
            ));
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::InvalidMarket(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} bytes"
            )));
        }
        let feed_id = FeedId::new(feed_id)?;
        if threshold <= 0 {
            return Err(EngineError::InvalidMarket(
                "threshold must be positive".to_string(),
            ));
        }
        if !(-18..=0).contains(&expected_exponent) {
            return Err(EngineError::InvalidMarket(format!(
                "expected exponent {expected_exponent} out of range"
            )));
        }
        if expires_at <= now {
            return Err(EngineError::InvalidMarket(
                "expiry must be in the future".to_string(),
            ));
        }

        let id = MarketId(self.next_market_id);
        self.next_market_id += 1;
        self.oracle.register(
            id,
            OracleConfig {
                feed_id: feed_id.clone(),
                threshold,
                expected_exponent,
                max_staleness_secs: self.config.max_staleness_secs,
                registered: true,
            },
        );
        self.markets.insert(
            id,
            Market::new(
                id,
                description.to_string(),
                feed_id.clone(),
                threshold,
                expected_exponent,
                expires_at,
                now,
            ),
        );
        self.events.push(EngineEvent::MarketCreated {
            market: id,
            description: description.to_string(),
            feed_id: feed_id.as_str().to_string(),
            threshold,
            expected_exponent,
            expires_at,
        });
        info!(market = %id, feed = %feed_id, threshold, expires_at, "market opened");
        Ok(id)
    }

    /// Record a stake on one side of an open market and issue the claim
    /// receipt.
    ///
    /// `value` is the amount the host actually collected from the staker;
    /// it must reconcile exactly with the declared `amount`.
    pub fn record_stake(
        &mut self,
        market_id: MarketId,
        staker: &AccountId,
        side: Side,
        amount: u64,
        value: u64,
    ) -> Result<StakeReceipt> {
        let now = self.now();
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        if market.status == MarketStatus::Resolved {
            return Err(EngineError::MarketAlreadyResolved(market_id));
        }
        if market.is_expired(now) {
            return Err(EngineError::MarketExpired {
                market: market_id,
                expires_at: market.expires_at,
                now,
            });
        }
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if amount < self.config.min_stake {
            return Err(EngineError::StakeBelowMinimum {
                sent: amount,
                required: self.config.min_stake,
            });
        }
        if value != amount {
            return Err(EngineError::ValueTransferMismatch {
                declared: amount,
                transferred: value,
            });
        }

        market.credit_stake(side, amount)?;
        let (pool_below, pool_above) = (market.pool_below, market.pool_above);
        let position = self
            .positions
            .issue(staker.clone(), market_id, side, amount);
        self.events.push(EngineEvent::StakeRecorded {
            market: market_id,
            position,
            staker: staker.clone(),
            side,
            amount,
            pool_below,
            pool_above,
        });
        info!(
            market = %market_id,
            position = %position,
            staker = %staker,
            side = %side,
            amount,
            "stake recorded"
        );
        Ok(StakeReceipt {
            position,
            pool_below,
            pool_above,
        })
    }

    /// Resolve an expired market against a price update.
    ///
    /// Permissionless: the update transcribes external, independently
    /// verifiable data, so validation replaces authorization. A second call
    /// on a resolved market fails with
    /// [`EngineError::MarketAlreadyResolved`] and changes nothing; a
    /// rejected update leaves the market open so resolution can be retried.
    pub fn resolve_market(
        &mut self,
        market_id: MarketId,
        update: &PriceUpdate,
    ) -> Result<Resolution> {
        let now = self.now();
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        if market.status == MarketStatus::Resolved {
            return Err(EngineError::MarketAlreadyResolved(market_id));
        }
        if self
            .oracle
            .config(market_id)
            .filter(|config| config.registered)
            .is_none()
        {
            return Err(EngineError::OracleNotRegistered(market_id));
        }
        if !market.is_expired(now) {
            return Err(EngineError::MarketNotExpired {
                market: market_id,
                expires_at: market.expires_at,
                now,
            });
        }

        let (feed_id, threshold) = match self.oracle.validate(market_id, update, now) {
            Ok(config) => (config.feed_id.clone(), config.threshold),
            Err(err) => {
                warn!(market = %market_id, %err, "rejected oracle update");
                return Err(err);
            }
        };

        let winning_side = oracle::winning_side(update.price, threshold);
        let fee_bps = self.config.fee_bps;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        market.resolve(winning_side, update.price, fee_bps)?;
        let total_pool = market.total_pool();
        if let Some(round) = update.round {
            self.oracle.record_round(&feed_id, round);
        }
        self.events.push(EngineEvent::MarketResolved {
            market: market_id,
            price: update.price,
            winning_side,
            total_pool,
        });
        info!(
            market = %market_id,
            price = update.price,
            winner = %winning_side,
            total_pool,
            "market resolved"
        );
        Ok(Resolution {
            winning_side,
            price: update.price,
        })
    }

    /// Settle one claim receipt against its resolved market and pay the
    /// owner through the host's custodian. Each receipt settles exactly
    /// once.
    pub fn claim_reward(
        &mut self,
        position_id: PositionId,
        claimant: &AccountId,
        vault: &mut dyn Vault,
    ) -> Result<u64> {
        let (owner, market_id, side, amount) = {
            let position = self.positions.get(position_id)?;
            if position.claimed {
                return Err(EngineError::AlreadyClaimed(position_id));
            }
            if &position.owner != claimant {
                return Err(EngineError::NotPositionOwner {
                    position: position_id,
                    caller: claimant.clone(),
                });
            }
            (
                position.owner.clone(),
                position.market,
                position.side,
                position.amount,
            )
        };
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let (winning_side, fee_bps) = match (market.winning_side, market.resolved_fee_bps) {
            (Some(winner), Some(fee_bps)) => (winner, fee_bps),
            _ => return Err(EngineError::MarketNotResolved(market_id)),
        };
        let winning_pool = market.pool(winning_side);
        let losing_pool = market.pool(winning_side.opposite());

        let payout = if winning_pool == 0 || losing_pool == 0 {
            // Degenerate market: one side never attracted stake, so there is
            // no ratio to distribute. Every position gets its stake back,
            // fee-free, whichever side it backed.
            payout::refund(amount)
        } else if side != winning_side {
            return Err(EngineError::NotWinningPosition(position_id));
        } else {
            payout::winning_payout(amount, winning_pool, losing_pool, fee_bps)?
        };
        if payout.net == 0 {
            return Err(EngineError::ZeroRewardAmount(position_id));
        }
        let treasury_total = self
            .treasury
            .checked_add(payout.fee)
            .ok_or(EngineError::ArithmeticOverflow)?;

        // Pay before mutating anything: a refused credit must leave the
        // position claimable.
        vault.credit(&owner, payout.net)?;

        self.positions.retire(position_id)?;
        self.treasury = treasury_total;
        self.events.push(EngineEvent::RewardClaimed {
            market: market_id,
            position: position_id,
            owner: owner.clone(),
            net_payout: payout.net,
        });
        if payout.fee > 0 {
            self.events.push(EngineEvent::FeeAccrued {
                market: market_id,
                amount: payout.fee,
                treasury_total,
            });
        }
        info!(
            market = %market_id,
            position = %position_id,
            owner = %owner,
            net = payout.net,
            fee = payout.fee,
            "reward claimed"
        );
        Ok(payout.net)
    }

    /// Hand a claim receipt to a new owner.
    pub fn transfer_position(
        &mut self,
        position_id: PositionId,
        caller: &AccountId,
        new_owner: &AccountId,
    ) -> Result<()> {
        self.positions
            .transfer(position_id, caller, new_owner.clone())?;
        self.events.push(EngineEvent::PositionTransferred {
            position: position_id,
            from: caller.clone(),
            to: new_owner.clone(),
        });
        info!(position = %position_id, from = %caller, to = %new_owner, "position transferred");
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn market(&self, id: MarketId) -> Result<Market> {
        self.markets
            .get(&id)
            .cloned()
            .ok_or(EngineError::MarketNotFound(id))
    }

    pub fn position(&self, id: PositionId) -> Result<Position> {
        self.positions.get(id).cloned()
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    /// Markets past expiry that nobody resolved yet, for the external
    /// upkeep poller.
    pub fn expired_unresolved(&self) -> Vec<MarketId> {
        let now = self.now();
        self.markets
            .values()
            .filter(|market| market.status == MarketStatus::Open && market.is_expired(now))
            .map(|market| market.id)
            .collect()
    }

    pub fn treasury_balance(&self) -> u64 {
        self.treasury
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Take every event emitted since the last drain, in commit order.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Administration ─────────────────────────────────────────────────

    fn require_admin(&self, caller: &AccountId) -> Result<()> {
        if caller != &self.config.admin {
            return Err(EngineError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    /// Change the protocol fee for markets resolved from now on. Markets
    /// already resolved keep the rate frozen at their resolution.
    pub fn set_fee_basis_points(&mut self, caller: &AccountId, fee_bps: u16) -> Result<()> {
        self.require_admin(caller)?;
        if fee_bps > 10_000 {
            return Err(EngineError::InvalidFeeBasisPoints(fee_bps));
        }
        self.config.fee_bps = fee_bps;
        info!(fee_bps, "protocol fee updated");
        Ok(())
    }

    /// Override the staleness bound for every market's oracle data.
    pub fn set_max_staleness(&mut self, caller: &AccountId, secs: u64) -> Result<()> {
        self.require_admin(caller)?;
        if secs == 0 {
            return Err(EngineError::InvalidConfig(
                "staleness bound must be positive".to_string(),
            ));
        }
        self.config.max_staleness_secs = secs;
        self.oracle.set_staleness_override(secs);
        info!(max_staleness_secs = secs, "staleness bound updated");
        Ok(())
    }

    /// Withdraw accrued fees to a recipient.
    pub fn withdraw_treasury(
        &mut self,
        caller: &AccountId,
        amount: u64,
        to: &AccountId,
        vault: &mut dyn Vault,
    ) -> Result<()> {
        self.require_admin(caller)?;
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if amount > self.treasury {
            return Err(EngineError::InsufficientTreasury {
                requested: amount,
                available: self.treasury,
            });
        }
        vault.credit(to, amount)?;
        self.treasury -= amount;
        self.events.push(EngineEvent::TreasuryWithdrawn {
            to: to.clone(),
            amount,
            remaining: self.treasury,
        });
        info!(%to, amount, remaining = self.treasury, "treasury withdrawn");
        Ok(())
    }
}
