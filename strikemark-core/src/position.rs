//! Claim receipts and the registry that issues, transfers and retires them.
//!
//! A [`Position`] is a transferable receipt for one stake. Ownership may
//! change hands any number of times before the claim; the staked
//! `(market, side, amount)` triple never changes after issue. Identifiers
//! are monotonically assigned and never reused, and a retired receipt stays
//! in the registry for history but can never be claimed or moved again.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{EngineError, Result};
use crate::market::{AccountId, MarketId, Side};

/// Unique claim-receipt identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transferable receipt recording one stake's market, side and amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    /// Current owner; the payout flows here on claim.
    pub owner: AccountId,
    pub market: MarketId,
    pub side: Side,
    /// Gross stake, before any fee.
    pub amount: u64,
    /// Set once, on settlement.
    pub claimed: bool,
}

/// Issues, transfers and retires claim receipts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRegistry {
    next_id: u64,
    positions: HashMap<PositionId, Position>,
}

impl Default for PositionRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            positions: HashMap::new(),
        }
    }
}

impl PositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh receipt. Called only by the stake ledger while it
    /// records a stake.
    pub fn issue(
        &mut self,
        owner: AccountId,
        market: MarketId,
        side: Side,
        amount: u64,
    ) -> PositionId {
        let id = PositionId(self.next_id);
        self.next_id += 1;
        self.positions.insert(
            id,
            Position {
                id,
                owner,
                market,
                side,
                amount,
                claimed: false,
            },
        );
        id
    }

    pub fn get(&self, id: PositionId) -> Result<&Position> {
        self.positions
            .get(&id)
            .ok_or(EngineError::PositionNotFound(id))
    }

    /// Move ownership of a live receipt. Allowed any time before the claim,
    /// pre- or post-resolution.
    pub fn transfer(
        &mut self,
        id: PositionId,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<()> {
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(EngineError::PositionNotFound(id))?;
        if position.claimed {
            return Err(EngineError::AlreadyClaimed(id));
        }
        if &position.owner != caller {
            return Err(EngineError::NotPositionOwner {
                position: id,
                caller: caller.clone(),
            });
        }
        position.owner = new_owner;
        Ok(())
    }

    /// Retire a receipt on successful settlement. Called only by reward
    /// distribution; the id is never reissued.
    pub fn retire(&mut self, id: PositionId) -> Result<()> {
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(EngineError::PositionNotFound(id))?;
        if position.claimed {
            return Err(EngineError::AlreadyClaimed(id));
        }
        position.claimed = true;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
