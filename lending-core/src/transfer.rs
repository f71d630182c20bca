//! Value transfer adapter
//!
//! The pool never moves funds itself. Collateral is pulled from depositors
//! and pushed back on withdrawal; settlement asset is pushed to borrowers and
//! refunded on overpayment. Settlement asset arriving with `lend` and
//! `repay_loan` is attached to the call and never pulled.
//!
//! Implementations must be all-or-nothing: an `Err` means nothing moved.

use crate::types::{AccountId, Amount, Asset};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Transfer failure reported by an adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Sender lacks funds or allowance
    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance {
        /// Sender balance
        available: Amount,
        /// Requested transfer
        requested: Amount,
    },

    /// Counterparty or network refused the transfer
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Moves assets between external parties and the pool
pub trait ValueTransfer: Send + Sync {
    /// Move `amount` of `asset` from `from` into pool custody
    fn pull(&self, asset: Asset, from: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` of `asset` from pool custody to `to`
    fn push(&self, asset: Asset, to: &AccountId, amount: Amount) -> Result<(), TransferError>;
}

/// In-memory wallet book for local nodes and tests.
///
/// Tracks what each external party holds outside the pool. Pulls debit the
/// party, pushes credit it. Either direction can be switched to fail.
#[derive(Debug, Default)]
pub struct InMemoryTransfer {
    balances: DashMap<(AccountId, Asset), Amount>,
    fail_pulls: AtomicBool,
    fail_pushes: AtomicBool,
}

impl InMemoryTransfer {
    /// Create empty wallet book
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `account` funds outside the pool
    pub fn credit(&self, account: &AccountId, asset: Asset, amount: Amount) {
        let mut balance = self.balances.entry((account.clone(), asset)).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Funds `account` holds outside the pool
    pub fn balance_of(&self, account: &AccountId, asset: Asset) -> Amount {
        self.balances
            .get(&(account.clone(), asset))
            .map(|b| *b)
            .unwrap_or(0)
    }

    /// Make every subsequent pull fail (or succeed again)
    pub fn set_fail_pulls(&self, fail: bool) {
        self.fail_pulls.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent push fail (or succeed again)
    pub fn set_fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }
}

impl ValueTransfer for InMemoryTransfer {
    fn pull(&self, asset: Asset, from: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.fail_pulls.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected(format!("pull of {} disabled", asset)));
        }

        let mut balance = self.balances.entry((from.clone(), asset)).or_insert(0);
        if *balance < amount {
            return Err(TransferError::InsufficientBalance {
                available: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn push(&self, asset: Asset, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected(format!("push of {} disabled", asset)));
        }

        let mut balance = self.balances.entry((to.clone(), asset)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("recipient balance overflow".to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_debits_sender() {
        let wallets = InMemoryTransfer::new();
        let alice = AccountId::new("alice");
        wallets.credit(&alice, Asset::Collateral, 100);

        wallets.pull(Asset::Collateral, &alice, 40).unwrap();
        assert_eq!(wallets.balance_of(&alice, Asset::Collateral), 60);
        assert_eq!(wallets.balance_of(&alice, Asset::Settlement), 0);
    }

    #[test]
    fn test_pull_is_all_or_nothing() {
        let wallets = InMemoryTransfer::new();
        let alice = AccountId::new("alice");
        wallets.credit(&alice, Asset::Collateral, 10);

        let err = wallets.pull(Asset::Collateral, &alice, 11).unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientBalance {
                available: 10,
                requested: 11
            }
        );
        assert_eq!(wallets.balance_of(&alice, Asset::Collateral), 10);
    }

    #[test]
    fn test_failure_switches() {
        let wallets = InMemoryTransfer::new();
        let bob = AccountId::new("bob");

        wallets.set_fail_pushes(true);
        assert!(wallets.push(Asset::Settlement, &bob, 5).is_err());
        assert_eq!(wallets.balance_of(&bob, Asset::Settlement), 0);

        wallets.set_fail_pushes(false);
        wallets.push(Asset::Settlement, &bob, 5).unwrap();
        assert_eq!(wallets.balance_of(&bob, Asset::Settlement), 5);
    }
}
