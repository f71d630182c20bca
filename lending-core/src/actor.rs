//! Actor front-end for the lending pool
//!
//! The pool is owned by one Tokio task; callers talk to it through a
//! cloneable [`PoolHandle`] over a bounded mailbox. Requests are processed
//! strictly in arrival order, one at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │        PoolHandle (Clone, many callers)        │
//! └──────────────────────┬────────────────────────┘
//!                        │ mpsc::channel (bounded)
//!                        ▼
//! ┌───────────────────────────────────────────────┐
//! │            PoolActor (single task)             │
//! │   LendingPool ──► ValueTransfer / PriceOracle  │
//! └──────────────────────┬────────────────────────┘
//!                        │ oneshot reply
//!                        ▼
//!                     caller
//! ```

use crate::pool::LendingPool;
use crate::types::{AccountId, AccountPosition, Amount, PoolSnapshot, Repayment};
use crate::{Error, Result};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the pool actor
#[derive(Debug)]
pub enum PoolMessage {
    /// Add attached settlement asset to the pool
    Lend {
        /// Calling account
        caller: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Post collateral
    DepositCollateral {
        /// Calling account
        caller: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Borrow settlement asset
    BorrowEth {
        /// Calling account
        caller: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Repay the whole loan
    RepayLoan {
        /// Calling account
        caller: AccountId,
        /// Settlement asset attached to the call
        sent_amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<Repayment>>,
    },

    /// Withdraw collateral
    WithdrawCollateral {
        /// Calling account
        caller: AccountId,
        /// Amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Change the LTV ratio
    SetLtvRatio {
        /// Calling account
        caller: AccountId,
        /// New LTV ratio (percent)
        new_ratio: u64,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Query borrowing cap
    MaxBorrowable {
        /// Account queried
        account: AccountId,
        /// Reply channel
        response: oneshot::Sender<Result<Amount>>,
    },

    /// Query account balances
    Position {
        /// Account queried
        account: AccountId,
        /// Reply channel
        response: oneshot::Sender<AccountPosition>,
    },

    /// Take a snapshot
    Snapshot {
        /// Reply channel
        response: oneshot::Sender<PoolSnapshot>,
    },

    /// Shutdown actor
    Shutdown {
        /// Reply channel
        response: oneshot::Sender<()>,
    },
}

/// Actor that owns the pool
#[derive(Debug)]
pub struct PoolActor {
    /// Pool state machine
    pool: LendingPool,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<PoolMessage>,
}

impl PoolActor {
    /// Create new actor
    pub fn new(pool: LendingPool, mailbox: mpsc::Receiver<PoolMessage>) -> Self {
        Self { pool, mailbox }
    }

    /// Run the actor event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let PoolMessage::Shutdown { response } = msg {
                tracing::info!("Pool actor shutting down");
                self.mailbox.close();
                let _ = response.send(());
                return;
            }
            self.handle_message(msg);
        }

        tracing::info!("Pool mailbox closed");
    }

    /// Handle a single message
    fn handle_message(&self, msg: PoolMessage) {
        match msg {
            PoolMessage::Lend {
                caller,
                amount,
                response,
            } => {
                let _ = response.send(self.pool.lend(&caller, amount));
            }

            PoolMessage::DepositCollateral {
                caller,
                amount,
                response,
            } => {
                let _ = response.send(self.pool.deposit_collateral(&caller, amount));
            }

            PoolMessage::BorrowEth {
                caller,
                amount,
                response,
            } => {
                let _ = response.send(self.pool.borrow_eth(&caller, amount));
            }

            PoolMessage::RepayLoan {
                caller,
                sent_amount,
                response,
            } => {
                let _ = response.send(self.pool.repay_loan(&caller, sent_amount));
            }

            PoolMessage::WithdrawCollateral {
                caller,
                amount,
                response,
            } => {
                let _ = response.send(self.pool.withdraw_collateral(&caller, amount));
            }

            PoolMessage::SetLtvRatio {
                caller,
                new_ratio,
                response,
            } => {
                let _ = response.send(self.pool.set_ltv_ratio(&caller, new_ratio));
            }

            PoolMessage::MaxBorrowable { account, response } => {
                let _ = response.send(self.pool.max_borrowable(&account));
            }

            PoolMessage::Position { account, response } => {
                let _ = response.send(self.pool.position(&account));
            }

            PoolMessage::Snapshot { response } => {
                let _ = response.send(self.pool.snapshot());
            }

            PoolMessage::Shutdown { .. } => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct PoolHandle {
    sender: mpsc::Sender<PoolMessage>,
}

impl PoolHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<PoolMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PoolMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Add attached settlement asset to the pool
    pub async fn lend(&self, caller: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::Lend {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Post collateral
    pub async fn deposit_collateral(&self, caller: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::DepositCollateral {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Borrow settlement asset
    pub async fn borrow_eth(&self, caller: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::BorrowEth {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Repay the whole loan
    pub async fn repay_loan(&self, caller: AccountId, sent_amount: Amount) -> Result<Repayment> {
        self.request(|response| PoolMessage::RepayLoan {
            caller,
            sent_amount,
            response,
        })
        .await?
    }

    /// Withdraw collateral
    pub async fn withdraw_collateral(&self, caller: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| PoolMessage::WithdrawCollateral {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Change the LTV ratio
    pub async fn set_ltv_ratio(&self, caller: AccountId, new_ratio: u64) -> Result<()> {
        self.request(|response| PoolMessage::SetLtvRatio {
            caller,
            new_ratio,
            response,
        })
        .await?
    }

    /// Query borrowing cap
    pub async fn max_borrowable(&self, account: AccountId) -> Result<Amount> {
        self.request(|response| PoolMessage::MaxBorrowable { account, response })
            .await?
    }

    /// Query account balances
    pub async fn position(&self, account: AccountId) -> Result<AccountPosition> {
        self.request(|response| PoolMessage::Position { account, response })
            .await
    }

    /// Take a snapshot
    pub async fn snapshot(&self) -> Result<PoolSnapshot> {
        self.request(|response| PoolMessage::Snapshot { response })
            .await
    }

    /// Shutdown actor and wait for it to stop taking requests
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response| PoolMessage::Shutdown { response })
            .await
    }
}

/// Spawn the pool actor
pub fn spawn_pool_actor(pool: LendingPool, mailbox_capacity: usize) -> PoolHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = PoolActor::new(pool, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    PoolHandle::new(tx)
}
