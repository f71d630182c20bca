//! Error types for the lending pool

use crate::types::{AccountId, Amount, Asset};
use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pool errors
///
/// Every variant aborts the operation that raised it without any
/// observable state change.
#[derive(Error, Debug)]
pub enum Error {
    /// Zero (or otherwise unusable) quantity
    #[error("Invalid amount for {operation}: must be greater than zero")]
    InvalidAmount {
        /// Operation that rejected the amount
        operation: &'static str,
    },

    /// Borrow attempted without any posted collateral
    #[error("No collateral deposited by {account}")]
    NoCollateral {
        /// Borrower
        account: AccountId,
    },

    /// Borrow would exceed the LTV-scaled collateral value
    #[error("LTV exceeded: {outstanding} outstanding + {requested} requested > {max_borrowable} allowed")]
    LtvExceeded {
        /// Requested borrow
        requested: Amount,
        /// Debt already outstanding
        outstanding: Amount,
        /// Cap computed from collateral
        max_borrowable: Amount,
    },

    /// Pool does not hold enough settlement asset
    #[error("Insufficient pool liquidity: requested {requested}, available {available}")]
    InsufficientPoolLiquidity {
        /// Requested borrow
        requested: Amount,
        /// Current pool balance
        available: Amount,
    },

    /// Repayment attempted with nothing owed
    #[error("No outstanding loan for {account}")]
    NoOutstandingLoan {
        /// Caller
        account: AccountId,
    },

    /// Repayment smaller than the debt
    #[error("Insufficient repayment: sent {sent}, owed {owed}")]
    InsufficientRepayment {
        /// Value attached to the call
        sent: Amount,
        /// Outstanding debt
        owed: Amount,
    },

    /// Collateral withdrawal attempted while a loan is open
    #[error("Outstanding loan of {outstanding} for {account}: repay before withdrawing collateral")]
    OutstandingLoan {
        /// Caller
        account: AccountId,
        /// Outstanding debt
        outstanding: Amount,
    },

    /// Collateral withdrawal larger than the deposit
    #[error("Insufficient collateral: requested {requested}, deposited {deposited}")]
    InsufficientCollateral {
        /// Requested withdrawal
        requested: Amount,
        /// Current deposit
        deposited: Amount,
    },

    /// Value transfer adapter reported failure
    #[error("Transfer of {asset} failed: {reason}")]
    TransferFailed {
        /// Asset being moved
        asset: Asset,
        /// Adapter-reported reason
        reason: String,
    },

    /// Caller is not the administrator
    #[error("Unauthorized: {caller} is not the pool administrator")]
    Unauthorized {
        /// Caller
        caller: AccountId,
    },

    /// Guarded operation entered from within another guarded operation
    #[error("Reentrant call rejected: {operation} invoked while another operation is in flight")]
    Reentrant {
        /// Operation that was rejected
        operation: &'static str,
    },

    /// Price oracle could not produce a rate
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Event journal hash chain broken
    #[error("Journal corrupted: {0}")]
    JournalCorrupted(String),

    /// Snapshot storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry or encoding error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable reason code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidAmount { .. } => "InvalidAmount",
            Error::NoCollateral { .. } => "NoCollateral",
            Error::LtvExceeded { .. } => "LtvExceeded",
            Error::InsufficientPoolLiquidity { .. } => "InsufficientPoolLiquidity",
            Error::NoOutstandingLoan { .. } => "NoOutstandingLoan",
            Error::InsufficientRepayment { .. } => "InsufficientRepayment",
            Error::OutstandingLoan { .. } => "OutstandingLoan",
            Error::InsufficientCollateral { .. } => "InsufficientCollateral",
            Error::TransferFailed { .. } => "TransferFailed",
            Error::Unauthorized { .. } => "Unauthorized",
            Error::Reentrant { .. } => "Reentrant",
            Error::Oracle(_) => "OracleError",
            Error::Overflow(_) => "Overflow",
            Error::JournalCorrupted(_) => "JournalCorrupted",
            Error::Storage(_) => "StorageError",
            Error::Serialization(_) => "SerializationError",
            Error::Concurrency(_) => "ConcurrencyError",
            Error::Config(_) => "ConfigError",
            Error::Metrics(_) => "MetricsError",
            Error::Io(_) => "IoError",
        }
    }

    /// Ledger rejection the caller can recover from by changing input or balances
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount { .. }
                | Error::NoCollateral { .. }
                | Error::LtvExceeded { .. }
                | Error::InsufficientPoolLiquidity { .. }
                | Error::NoOutstandingLoan { .. }
                | Error::InsufficientRepayment { .. }
                | Error::OutstandingLoan { .. }
                | Error::InsufficientCollateral { .. }
                | Error::TransferFailed { .. }
                | Error::Unauthorized { .. }
                | Error::Reentrant { .. }
        )
    }
}
