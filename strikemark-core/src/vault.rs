//! Value custody seam between the engine and its host.
//!
//! The engine is a ledger, not a custodian: the host collects staked value
//! before calling [`record_stake`](crate::MarketEngine::record_stake) and
//! the engine only ever asks the custodian to credit a payout or a treasury
//! withdrawal. Any credit error rolls the triggering operation back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::market::AccountId;

/// Errors surfaced by a [`Vault`] when value movement fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The custodian does not hold enough value for the movement.
    #[error("insufficient funds: {account} holds {available}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        available: u64,
        needed: u64,
    },

    /// The custodian refused the movement.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Moves value out of custody toward a recipient.
pub trait Vault {
    fn credit(&mut self, to: &AccountId, amount: u64) -> std::result::Result<(), VaultError>;
}

/// A process-local custodian backed by a balance map.
///
/// Used by the CLI host and by tests; a production host would implement
/// [`Vault`] over its own settlement rails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryVault {
    balances: HashMap<AccountId, u64>,
    /// When set, the next credit fails with this reason. Test hook for the
    /// rollback path.
    #[serde(skip)]
    fail_next: Option<String>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Add value to an account, e.g. when the host funds a staker.
    pub fn deposit(&mut self, account: &AccountId, amount: u64) {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Remove value from an account, e.g. when the host collects a stake.
    pub fn debit(&mut self, account: &AccountId, amount: u64) -> Result<(), VaultError> {
        let available = self.balance(account);
        if available < amount {
            return Err(VaultError::InsufficientFunds {
                account: account.clone(),
                available,
                needed: amount,
            });
        }
        self.balances.insert(account.clone(), available - amount);
        Ok(())
    }

    pub fn fail_next_credit(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, u64)> {
        self.balances.iter().map(|(account, balance)| (account, *balance))
    }
}

impl Vault for InMemoryVault {
    fn credit(&mut self, to: &AccountId, amount: u64) -> Result<(), VaultError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(VaultError::Rejected(reason));
        }
        self.deposit(to, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carol() -> AccountId {
        AccountId::from("carol")
    }

    #[test]
    fn deposit_debit_round_trip() {
        let mut vault = InMemoryVault::new();
        vault.deposit(&carol(), 500);
        assert_eq!(vault.balance(&carol()), 500);

        vault.debit(&carol(), 200).unwrap();
        assert_eq!(vault.balance(&carol()), 300);
    }

    #[test]
    fn overdraft_is_rejected_without_partial_effect() {
        let mut vault = InMemoryVault::new();
        vault.deposit(&carol(), 100);
        let err = vault.debit(&carol(), 101).unwrap_err();
        assert_eq!(
            err,
            VaultError::InsufficientFunds {
                account: carol(),
                available: 100,
                needed: 101
            }
        );
        assert_eq!(vault.balance(&carol()), 100);
    }

    #[test]
    fn injected_failure_hits_exactly_one_credit() {
        let mut vault = InMemoryVault::new();
        vault.fail_next_credit("custodian offline");
        assert!(vault.credit(&carol(), 10).is_err());
        // The failure is one-shot.
        vault.credit(&carol(), 10).unwrap();
        assert_eq!(vault.balance(&carol()), 10);
    }
}
