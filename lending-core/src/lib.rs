//! Lending Core
//!
//! Single-pool collateralized lending ledger: lenders add settlement asset
//! (ETH-equivalent) to a shared pool, borrowers post one collateral token and
//! borrow against it up to a loan-to-value cap priced by an external oracle.
//!
//! # Architecture
//!
//! - **Ledger**: [`LendingPool`] owns balances and enforces every invariant
//! - **Adapters**: funds move through [`ValueTransfer`], prices come from [`PriceOracle`]
//! - **Single Writer**: one re-entrant mutex per pool, or one actor task via [`spawn_pool_actor`]
//! - **Journal**: every state transition emits a hash-chained [`PoolEvent`]
//! - **HTTP**: [`api::router`] exposes the actor over JSON routes
//!
//! # Invariants
//!
//! - Pool balance never negative
//! - Debt never exceeds LTV-scaled collateral value at the moment of borrowing
//! - No collateral withdrawal while a loan is outstanding
//! - Failed operations are atomic: no partial effects

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod error;
pub mod config;
pub mod oracle;
pub mod transfer;
pub mod valuation;
pub mod guard;
pub mod events;
pub mod pool;
pub mod actor;
pub mod storage;
pub mod metrics;
pub mod api;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    AccountId, AccountPosition, Amount, Asset, AssetId, BorrowCapacity, OracleId, PoolParams,
    PoolSnapshot, Repayment, RoundData,
};
pub use config::Config;
pub use oracle::{FixedPriceOracle, PriceOracle};
pub use transfer::{InMemoryTransfer, TransferError, ValueTransfer};
pub use events::{EventJournal, EventKind, PoolEvent};
pub use pool::LendingPool;
pub use actor::{spawn_pool_actor, PoolHandle};
pub use storage::SnapshotStore;
pub use metrics::Metrics;
