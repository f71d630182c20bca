//! Lending pool state machine
//!
//! One pool holds settlement-asset liquidity from lenders and lends it to
//! borrowers against a single collateral token valued through a
//! [`PriceOracle`].
//!
//! # Invariants
//!
//! - Pool balance never goes below zero (checked arithmetic)
//! - After a borrow, `amount_borrowed <= max_borrowable` at that moment's rate
//! - No collateral leaves an account while it owes anything
//! - A failed operation leaves no trace: balances, journal and metrics gauges
//!   are exactly as before
//!
//! # Execution model
//!
//! All state sits behind a re-entrant mutex held for the whole operation, so
//! operations from different threads are serialized. Adapters are called
//! with the mutex held; when one calls back into the pool on the same thread,
//! read queries succeed and mutating operations fail with
//! [`Error::Reentrant`]. Balances are updated before any outbound push and
//! restored if the push fails.

use crate::{
    events::{EventJournal, EventKind, PoolEvent},
    guard::ReentrancyGuard,
    metrics::Metrics,
    oracle::PriceOracle,
    transfer::{TransferError, ValueTransfer},
    types::{
        AccountId, AccountPosition, Amount, Asset, AssetId, BorrowCapacity, OracleId, PoolParams,
        PoolSnapshot, Repayment,
    },
    valuation, Error, Result,
};
use chrono::Utc;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutable ledger state
#[derive(Debug)]
struct PoolState {
    pool_balance: Amount,
    ltv_ratio: u64,
    positions: HashMap<AccountId, AccountPosition>,
    journal: EventJournal,
}

impl PoolState {
    fn position(&self, account: &AccountId) -> AccountPosition {
        self.positions.get(account).copied().unwrap_or_default()
    }

    fn position_mut(&mut self, account: &AccountId) -> &mut AccountPosition {
        self.positions.entry(account.clone()).or_default()
    }

    /// Put back balances captured before a failed interaction
    fn restore(&mut self, account: &AccountId, position: AccountPosition, pool_balance: Amount) {
        *self.position_mut(account) = position;
        self.pool_balance = pool_balance;
    }

    fn total_borrowed(&self) -> Amount {
        self.positions
            .values()
            .fold(0, |acc, p| acc.saturating_add(p.amount_borrowed))
    }

    fn total_collateral(&self) -> Amount {
        self.positions
            .values()
            .fold(0, |acc, p| acc.saturating_add(p.collateral_deposited))
    }
}

/// Collateralized lending pool
pub struct LendingPool {
    params: PoolParams,
    state: ReentrantMutex<RefCell<PoolState>>,
    guard: ReentrancyGuard,
    transfer: Arc<dyn ValueTransfer>,
    oracle: Arc<dyn PriceOracle>,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for LendingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingPool")
            .field("params", &self.params)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl LendingPool {
    /// Create an empty pool
    pub fn new(
        params: PoolParams,
        transfer: Arc<dyn ValueTransfer>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self> {
        if params.price_scale == 0 {
            return Err(Error::Config("price scale must be positive".to_string()));
        }

        tracing::info!(
            administrator = %params.administrator,
            collateral_asset = %params.collateral_asset,
            price_oracle = %params.price_oracle,
            ltv_ratio = params.initial_ltv_ratio,
            "Lending pool created"
        );

        let state = PoolState {
            pool_balance: 0,
            ltv_ratio: params.initial_ltv_ratio,
            positions: HashMap::new(),
            journal: EventJournal::new(),
        };

        Ok(Self {
            params,
            state: ReentrantMutex::new(RefCell::new(state)),
            guard: ReentrancyGuard::new(),
            transfer,
            oracle,
            metrics: None,
        })
    }

    /// Rebuild a pool from a snapshot
    pub fn restore(
        snapshot: PoolSnapshot,
        transfer: Arc<dyn ValueTransfer>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self> {
        let journal = EventJournal::from_events(snapshot.events)?;
        let pool = Self::new(snapshot.params, transfer, oracle)?;

        {
            let cell = pool.state.lock();
            let mut state = cell.borrow_mut();
            state.pool_balance = snapshot.pool_balance;
            state.ltv_ratio = snapshot.ltv_ratio;
            state.positions = snapshot.positions.into_iter().collect();
            state.journal = journal;

            tracing::info!(
                pool_balance = state.pool_balance,
                accounts = state.positions.len(),
                events = state.journal.len(),
                "Lending pool restored from snapshot"
            );
        }

        Ok(pool)
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        {
            let cell = self.state.lock();
            let state = cell.borrow();
            metrics.update_balances(state.pool_balance, state.total_borrowed());
        }
        self.metrics = Some(metrics);
        self
    }

    /// Add settlement asset attached to the call to the pool.
    ///
    /// No claim is recorded for the lender.
    pub fn lend(&self, caller: &AccountId, amount: Amount) -> Result<()> {
        self.guarded("lend", |state| {
            if amount == 0 {
                return Err(Error::InvalidAmount { operation: "lend" });
            }

            let mut state = state.borrow_mut();
            state.pool_balance = state
                .pool_balance
                .checked_add(amount)
                .ok_or_else(|| Error::Overflow("pool balance".to_string()))?;
            state.journal.record(EventKind::EthLent, caller, amount);

            tracing::info!(account = %caller, amount, pool_balance = state.pool_balance, "ETH lent");
            Ok(())
        })
    }

    /// Pull collateral from `caller` and credit it once the pull succeeds
    pub fn deposit_collateral(&self, caller: &AccountId, amount: Amount) -> Result<()> {
        self.guarded("deposit_collateral", |state| {
            if amount == 0 {
                return Err(Error::InvalidAmount {
                    operation: "deposit_collateral",
                });
            }

            let deposited = state
                .borrow()
                .position(caller)
                .collateral_deposited
                .checked_add(amount)
                .ok_or_else(|| Error::Overflow("collateral deposited".to_string()))?;

            self.transfer
                .pull(Asset::Collateral, caller, amount)
                .map_err(|e| transfer_failed(Asset::Collateral, e))?;

            let mut state = state.borrow_mut();
            state.position_mut(caller).collateral_deposited = deposited;
            state.journal.record(EventKind::CollateralDeposited, caller, amount);

            tracing::info!(account = %caller, amount, collateral = deposited, "Collateral deposited");
            Ok(())
        })
    }

    /// Borrow settlement asset against posted collateral
    pub fn borrow_eth(&self, caller: &AccountId, amount: Amount) -> Result<()> {
        self.guarded("borrow_eth", |state| {
            if amount == 0 {
                return Err(Error::InvalidAmount {
                    operation: "borrow_eth",
                });
            }

            let prior = state.borrow().position(caller);
            if prior.collateral_deposited == 0 {
                return Err(Error::NoCollateral {
                    account: caller.clone(),
                });
            }

            let max_borrowable = self.max_borrowable_in(state, caller)?;
            let new_debt = prior
                .amount_borrowed
                .checked_add(amount)
                .ok_or_else(|| Error::Overflow("amount borrowed".to_string()))?;
            if new_debt > max_borrowable {
                return Err(Error::LtvExceeded {
                    requested: amount,
                    outstanding: prior.amount_borrowed,
                    max_borrowable,
                });
            }

            let prior_pool = state.borrow().pool_balance;
            if prior_pool < amount {
                return Err(Error::InsufficientPoolLiquidity {
                    requested: amount,
                    available: prior_pool,
                });
            }

            {
                let mut state = state.borrow_mut();
                state.pool_balance = prior_pool - amount;
                state.position_mut(caller).amount_borrowed = new_debt;
            }

            if let Err(e) = self.transfer.push(Asset::Settlement, caller, amount) {
                state.borrow_mut().restore(caller, prior, prior_pool);
                return Err(transfer_failed(Asset::Settlement, e));
            }

            let mut state = state.borrow_mut();
            state.journal.record(EventKind::EthBorrowed, caller, amount);

            tracing::info!(
                account = %caller,
                amount,
                amount_borrowed = new_debt,
                max_borrowable,
                pool_balance = state.pool_balance,
                "ETH borrowed"
            );
            Ok(())
        })
    }

    /// Repay the whole loan with settlement asset attached to the call.
    ///
    /// Balances are committed before any overpayment is refunded. If the
    /// refund push fails they are rolled back and the repayment fails.
    pub fn repay_loan(&self, caller: &AccountId, sent_amount: Amount) -> Result<Repayment> {
        self.guarded("repay_loan", |state| {
            let prior = state.borrow().position(caller);
            let owed = prior.amount_borrowed;
            if owed == 0 {
                return Err(Error::NoOutstandingLoan {
                    account: caller.clone(),
                });
            }
            if sent_amount < owed {
                return Err(Error::InsufficientRepayment {
                    sent: sent_amount,
                    owed,
                });
            }

            let prior_pool = state.borrow().pool_balance;
            let new_pool = prior_pool
                .checked_add(owed)
                .ok_or_else(|| Error::Overflow("pool balance".to_string()))?;

            {
                let mut state = state.borrow_mut();
                state.position_mut(caller).amount_borrowed = 0;
                state.pool_balance = new_pool;
            }

            let refund = sent_amount - owed;
            if refund > 0 {
                if let Err(e) = self.transfer.push(Asset::Settlement, caller, refund) {
                    state.borrow_mut().restore(caller, prior, prior_pool);
                    return Err(transfer_failed(Asset::Settlement, e));
                }
            }

            let mut state = state.borrow_mut();
            state.journal.record(EventKind::LoanRepaid, caller, owed);

            tracing::info!(account = %caller, repaid = owed, refund, pool_balance = new_pool, "Loan repaid");
            Ok(Repayment {
                repaid: owed,
                refunded: refund,
            })
        })
    }

    /// Return collateral to an account with no outstanding loan
    pub fn withdraw_collateral(&self, caller: &AccountId, amount: Amount) -> Result<()> {
        self.guarded("withdraw_collateral", |state| {
            let prior = state.borrow().position(caller);
            if prior.has_loan() {
                return Err(Error::OutstandingLoan {
                    account: caller.clone(),
                    outstanding: prior.amount_borrowed,
                });
            }
            if amount == 0 {
                return Err(Error::InvalidAmount {
                    operation: "withdraw_collateral",
                });
            }
            if prior.collateral_deposited < amount {
                return Err(Error::InsufficientCollateral {
                    requested: amount,
                    deposited: prior.collateral_deposited,
                });
            }

            let prior_pool = state.borrow().pool_balance;
            state.borrow_mut().position_mut(caller).collateral_deposited =
                prior.collateral_deposited - amount;

            if let Err(e) = self.transfer.push(Asset::Collateral, caller, amount) {
                state.borrow_mut().restore(caller, prior, prior_pool);
                return Err(transfer_failed(Asset::Collateral, e));
            }

            let mut state = state.borrow_mut();
            state.journal.record(EventKind::CollateralWithdrawn, caller, amount);

            tracing::info!(
                account = %caller,
                amount,
                collateral = prior.collateral_deposited - amount,
                "Collateral withdrawn"
            );
            Ok(())
        })
    }

    /// Change the LTV ratio (administrator only).
    ///
    /// Values are not bounded; a ratio above 100 lets future borrows exceed
    /// collateral value.
    pub fn set_ltv_ratio(&self, caller: &AccountId, new_ratio: u64) -> Result<()> {
        self.guarded("set_ltv_ratio", |state| {
            if caller != &self.params.administrator {
                return Err(Error::Unauthorized {
                    caller: caller.clone(),
                });
            }

            let mut state = state.borrow_mut();
            let previous = state.ltv_ratio;
            state.ltv_ratio = new_ratio;

            if new_ratio > 100 {
                tracing::warn!(new_ratio, "LTV ratio above 100%: loans may exceed collateral value");
            }
            tracing::info!(previous, new_ratio, "LTV ratio updated");
            Ok(())
        })
    }

    /// Maximum total debt `account` can carry at the current oracle rate
    pub fn max_borrowable(&self, account: &AccountId) -> Result<Amount> {
        let state = self.state.lock();
        self.max_borrowable_in(&state, account)
    }

    /// Borrowing headroom of `account` at the current oracle rate
    pub fn borrow_capacity(&self, account: &AccountId) -> Result<BorrowCapacity> {
        let state = self.state.lock();
        let amount_borrowed = state.borrow().position(account).amount_borrowed;
        let max_borrowable = self.max_borrowable_in(&state, account)?;

        Ok(BorrowCapacity {
            max_borrowable,
            amount_borrowed,
            headroom: max_borrowable.saturating_sub(amount_borrowed),
        })
    }

    /// Balances of `account` (zero for unknown accounts)
    pub fn position(&self, account: &AccountId) -> AccountPosition {
        self.state.lock().borrow().position(account)
    }

    /// Settlement asset available for borrowing
    pub fn pool_balance(&self) -> Amount {
        self.state.lock().borrow().pool_balance
    }

    /// Current LTV ratio (percent)
    pub fn ltv_ratio(&self) -> u64 {
        self.state.lock().borrow().ltv_ratio
    }

    /// Sum of all outstanding debt
    pub fn total_borrowed(&self) -> Amount {
        self.state.lock().borrow().total_borrowed()
    }

    /// Sum of all posted collateral
    pub fn total_collateral(&self) -> Amount {
        self.state.lock().borrow().total_collateral()
    }

    /// Administrator identity
    pub fn administrator(&self) -> &AccountId {
        &self.params.administrator
    }

    /// Collateral token identity
    pub fn collateral_asset(&self) -> &AssetId {
        &self.params.collateral_asset
    }

    /// Price feed reference
    pub fn oracle(&self) -> &OracleId {
        &self.params.price_oracle
    }

    /// Construction-time parameters
    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    /// Emitted notifications in order
    pub fn events(&self) -> Vec<PoolEvent> {
        self.state.lock().borrow().journal.events().to_vec()
    }

    /// Notifications concerning `account`
    pub fn events_for(&self, account: &AccountId) -> Vec<PoolEvent> {
        self.state
            .lock()
            .borrow()
            .journal
            .events_for(account)
            .cloned()
            .collect()
    }

    /// Verify the journal hash chain
    pub fn verify_journal(&self) -> Result<()> {
        self.state.lock().borrow().journal.verify_chain()
    }

    /// Point-in-time copy of the pool
    pub fn snapshot(&self) -> PoolSnapshot {
        let cell = self.state.lock();
        let state = cell.borrow();

        PoolSnapshot {
            params: self.params.clone(),
            ltv_ratio: state.ltv_ratio,
            pool_balance: state.pool_balance,
            positions: state
                .positions
                .iter()
                .filter(|(_, p)| !p.is_empty())
                .map(|(a, p)| (a.clone(), *p))
                .collect(),
            events: state.journal.events().to_vec(),
            taken_at: Utc::now(),
        }
    }

    /// Run a mutating operation under the mutex and the reentrancy guard
    fn guarded<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&RefCell<PoolState>) -> Result<R>,
    ) -> Result<R> {
        let cell = self.state.lock();
        let result = self
            .guard
            .enter(operation)
            .and_then(|_entered| f(&*cell));

        match &result {
            Ok(_) => {
                if let Some(metrics) = &self.metrics {
                    let state = cell.borrow();
                    metrics.record_success(operation);
                    metrics.update_balances(state.pool_balance, state.total_borrowed());
                }
            }
            Err(e) => {
                tracing::warn!(operation, code = e.code(), error = %e, "Operation rejected");
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection(e.code());
                }
            }
        }

        result
    }

    fn max_borrowable_in(&self, state: &RefCell<PoolState>, account: &AccountId) -> Result<Amount> {
        let (collateral, ltv_ratio) = {
            let state = state.borrow();
            (state.position(account).collateral_deposited, state.ltv_ratio)
        };
        if collateral == 0 {
            return Ok(0);
        }

        let round = self.oracle.latest_round()?;
        let max = valuation::max_borrowable(collateral, round.rate, self.params.price_scale, ltv_ratio)?;

        tracing::debug!(
            account = %account,
            collateral,
            rate = round.rate,
            round_id = round.round_id,
            ltv_ratio,
            max_borrowable = max,
            "Collateral valued"
        );
        Ok(max)
    }
}

fn transfer_failed(asset: Asset, err: TransferError) -> Error {
    Error::TransferFailed {
        asset,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FixedPriceOracle;
    use crate::transfer::InMemoryTransfer;
    use crate::valuation::DEFAULT_PRICE_SCALE;

    const ONE: Amount = DEFAULT_PRICE_SCALE;

    struct Fixture {
        pool: LendingPool,
        wallets: Arc<InMemoryTransfer>,
        oracle: Arc<FixedPriceOracle>,
        admin: AccountId,
        lender: AccountId,
        borrower: AccountId,
    }

    fn fixture() -> Fixture {
        let wallets = Arc::new(InMemoryTransfer::new());
        let oracle = Arc::new(FixedPriceOracle::new(ONE));
        let admin = AccountId::new("admin");
        let params = PoolParams {
            administrator: admin.clone(),
            collateral_asset: AssetId::new("COLL"),
            price_oracle: OracleId::new("COLL/ETH"),
            price_scale: ONE,
            initial_ltv_ratio: 75,
        };
        let pool = LendingPool::new(params, wallets.clone(), oracle.clone()).unwrap();

        let borrower = AccountId::new("borrower");
        wallets.credit(&borrower, Asset::Collateral, 1_000);

        Fixture {
            pool,
            wallets,
            oracle,
            admin,
            lender: AccountId::new("lender"),
            borrower,
        }
    }

    #[test]
    fn test_lend_increases_pool() {
        let f = fixture();
        f.pool.lend(&f.lender, 10).unwrap();
        assert_eq!(f.pool.pool_balance(), 10);
        assert_eq!(f.pool.events()[0].kind, EventKind::EthLent);
    }

    #[test]
    fn test_lend_zero_rejected() {
        let f = fixture();
        let err = f.pool.lend(&f.lender, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
        assert!(f.pool.events().is_empty());
    }

    #[test]
    fn test_deposit_pull_failure_leaves_state() {
        let f = fixture();
        f.wallets.set_fail_pulls(true);

        let err = f.pool.deposit_collateral(&f.borrower, 100).unwrap_err();
        assert!(matches!(err, Error::TransferFailed { asset: Asset::Collateral, .. }));
        assert_eq!(f.pool.position(&f.borrower), AccountPosition::default());
        assert_eq!(f.wallets.balance_of(&f.borrower, Asset::Collateral), 1_000);
    }

    #[test]
    fn test_deposit_without_funds_rejected() {
        let f = fixture();
        let err = f.pool.deposit_collateral(&f.borrower, 5_000).unwrap_err();
        assert_eq!(err.code(), "TransferFailed");
        assert_eq!(f.pool.position(&f.borrower).collateral_deposited, 0);
    }

    #[test]
    fn test_borrow_without_collateral() {
        let f = fixture();
        f.pool.lend(&f.lender, 100).unwrap();
        let err = f.pool.borrow_eth(&f.borrower, 1).unwrap_err();
        assert!(matches!(err, Error::NoCollateral { .. }));
    }

    #[test]
    fn test_borrow_push_failure_rolls_back() {
        let f = fixture();
        f.pool.lend(&f.lender, 100).unwrap();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        f.wallets.set_fail_pushes(true);

        let err = f.pool.borrow_eth(&f.borrower, 50).unwrap_err();
        assert!(matches!(err, Error::TransferFailed { asset: Asset::Settlement, .. }));
        assert_eq!(f.pool.pool_balance(), 100);
        assert_eq!(f.pool.position(&f.borrower).amount_borrowed, 0);
        assert_eq!(f.pool.events().len(), 2);
    }

    #[test]
    fn test_borrow_pushes_funds() {
        let f = fixture();
        f.pool.lend(&f.lender, 100).unwrap();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        f.pool.borrow_eth(&f.borrower, 60).unwrap();

        assert_eq!(f.wallets.balance_of(&f.borrower, Asset::Settlement), 60);
        assert_eq!(f.pool.total_borrowed(), 60);
        assert_eq!(f.pool.total_collateral(), 100);
    }

    #[test]
    fn test_repay_below_debt_rejected() {
        let f = fixture();
        f.pool.lend(&f.lender, 100).unwrap();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        f.pool.borrow_eth(&f.borrower, 75).unwrap();

        let err = f.pool.repay_loan(&f.borrower, 74).unwrap_err();
        assert!(matches!(err, Error::InsufficientRepayment { sent: 74, owed: 75 }));
        assert_eq!(f.pool.position(&f.borrower).amount_borrowed, 75);
    }

    #[test]
    fn test_repay_without_loan() {
        let f = fixture();
        let err = f.pool.repay_loan(&f.borrower, 10).unwrap_err();
        assert!(matches!(err, Error::NoOutstandingLoan { .. }));
    }

    #[test]
    fn test_withdraw_more_than_deposited() {
        let f = fixture();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        let err = f.pool.withdraw_collateral(&f.borrower, 101).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientCollateral {
                requested: 101,
                deposited: 100
            }
        ));
    }

    #[test]
    fn test_withdraw_zero_rejected() {
        let f = fixture();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        let err = f.pool.withdraw_collateral(&f.borrower, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
    }

    #[test]
    fn test_withdraw_push_failure_rolls_back() {
        let f = fixture();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        f.wallets.set_fail_pushes(true);

        assert!(f.pool.withdraw_collateral(&f.borrower, 40).is_err());
        assert_eq!(f.pool.position(&f.borrower).collateral_deposited, 100);
        assert_eq!(f.wallets.balance_of(&f.borrower, Asset::Collateral), 900);
    }

    #[test]
    fn test_set_ltv_ratio_requires_admin() {
        let f = fixture();
        let err = f.pool.set_ltv_ratio(&f.borrower, 90).unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }));
        assert_eq!(f.pool.ltv_ratio(), 75);

        f.pool.set_ltv_ratio(&f.admin, 90).unwrap();
        assert_eq!(f.pool.ltv_ratio(), 90);
    }

    #[test]
    fn test_ltv_ratio_is_not_bounded() {
        let f = fixture();
        f.pool.set_ltv_ratio(&f.admin, 200).unwrap();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        assert_eq!(f.pool.max_borrowable(&f.borrower).unwrap(), 200);
    }

    #[test]
    fn test_price_drop_does_not_unwind_loan() {
        let f = fixture();
        f.pool.lend(&f.lender, 100).unwrap();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        f.pool.borrow_eth(&f.borrower, 75).unwrap();

        f.oracle.set_rate(ONE / 2);
        let capacity = f.pool.borrow_capacity(&f.borrower).unwrap();
        assert_eq!(capacity.max_borrowable, 37);
        assert_eq!(capacity.amount_borrowed, 75);
        assert_eq!(capacity.headroom, 0);
        assert_eq!(f.pool.position(&f.borrower).amount_borrowed, 75);
    }

    #[test]
    fn test_metrics_follow_operations() {
        let f = fixture();
        let metrics = Metrics::new().unwrap();
        let pool = f.pool.with_metrics(metrics.clone());

        pool.lend(&f.lender, 100).unwrap();
        assert!(pool.lend(&f.lender, 0).is_err());

        assert_eq!(metrics.pool_balance.get(), 100);
        assert_eq!(metrics.operations_total.with_label_values(&["lend"]).get(), 1);
        assert_eq!(
            metrics
                .rejections_total
                .with_label_values(&["InvalidAmount"])
                .get(),
            1
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let f = fixture();
        f.pool.lend(&f.lender, 100).unwrap();
        f.pool.deposit_collateral(&f.borrower, 100).unwrap();
        f.pool.borrow_eth(&f.borrower, 50).unwrap();
        f.pool.set_ltv_ratio(&f.admin, 60).unwrap();

        let snapshot = f.pool.snapshot();
        assert_eq!(snapshot.total_borrowed(), 50);

        let restored = LendingPool::restore(snapshot, f.wallets.clone(), f.oracle.clone()).unwrap();
        assert_eq!(restored.pool_balance(), 50);
        assert_eq!(restored.ltv_ratio(), 60);
        assert_eq!(restored.position(&f.borrower), f.pool.position(&f.borrower));
        assert_eq!(restored.events().len(), 3);
        restored.verify_journal().unwrap();
    }
}
