//! Core types for the lending pool
//!
//! All amounts are unsigned integers in the smallest unit of their asset
//! (wei for the settlement asset, base units for the collateral token).
//! Arithmetic on them is always checked.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::events::PoolEvent;

/// Quantity of the settlement or collateral asset in base units
pub type Amount = u128;

/// Participant identity (wallet address, account handle, etc.)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identity of the collateral token accepted by the pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Create new asset ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the price feed the pool reads its exchange rate from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OracleId(String);

impl OracleId {
    /// Create new oracle reference
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two assets a transfer moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native settlement asset (ETH-equivalent), lent and borrowed
    Settlement,
    /// Collateral token posted by borrowers
    Collateral,
}

impl Asset {
    /// Short code used in logs and error messages
    pub fn code(&self) -> &'static str {
        match self {
            Asset::Settlement => "settlement",
            Asset::Collateral => "collateral",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-account balances held by the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPosition {
    /// Collateral posted by the account
    pub collateral_deposited: Amount,

    /// Settlement asset currently owed by the account
    pub amount_borrowed: Amount,
}

impl AccountPosition {
    /// Account has an outstanding loan
    pub fn has_loan(&self) -> bool {
        self.amount_borrowed > 0
    }

    /// Both balances are zero
    pub fn is_empty(&self) -> bool {
        self.collateral_deposited == 0 && self.amount_borrowed == 0
    }
}

/// One reading of the price feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    /// Settlement-asset value of one collateral unit, scaled by the pool's price scale
    pub rate: Amount,

    /// When the feed last updated this rate
    pub updated_at: DateTime<Utc>,

    /// Feed round identifier
    pub round_id: u64,
}

/// Parameters fixed when the pool is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    /// Identity allowed to change the LTV ratio
    pub administrator: AccountId,

    /// Collateral token accepted by the pool
    pub collateral_asset: AssetId,

    /// Price feed reference
    pub price_oracle: OracleId,

    /// Fixed-point scale of oracle rates (e.g. 10^18)
    pub price_scale: Amount,

    /// LTV ratio (percent) in force at creation
    pub initial_ltv_ratio: u64,
}

/// Result of a successful repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repayment {
    /// Debt cleared and returned to the pool
    pub repaid: Amount,

    /// Overpayment pushed back to the borrower
    pub refunded: Amount,
}

/// Borrowing capacity of one account at the current oracle rate.
///
/// Informational only: nothing is enforced from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowCapacity {
    /// LTV-scaled collateral value
    pub max_borrowable: Amount,

    /// Current debt
    pub amount_borrowed: Amount,

    /// Additional amount the account could borrow (0 when under water)
    pub headroom: Amount,
}

/// Point-in-time copy of the whole pool, used for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Construction-time parameters
    pub params: PoolParams,

    /// Current LTV ratio
    pub ltv_ratio: u64,

    /// Settlement asset available for borrowing
    pub pool_balance: Amount,

    /// Non-empty positions keyed by account
    pub positions: BTreeMap<AccountId, AccountPosition>,

    /// Notification journal
    pub events: Vec<PoolEvent>,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl PoolSnapshot {
    /// Sum of all outstanding debt
    pub fn total_borrowed(&self) -> Amount {
        self.positions
            .values()
            .fold(0, |acc, p| acc.saturating_add(p.amount_borrowed))
    }

    /// Sum of all posted collateral
    pub fn total_collateral(&self) -> Amount {
        self.positions
            .values()
            .fold(0, |acc, p| acc.saturating_add(p.collateral_deposited))
    }
}

/// Convert a base-unit amount to a human-readable decimal (e.g. wei to ETH)
pub fn format_units(amount: Amount, decimals: u32) -> crate::Result<Decimal> {
    let value = i128::try_from(amount)
        .map_err(|_| crate::Error::Overflow(format!("{} does not fit a decimal", amount)))?;

    Decimal::try_from_i128_with_scale(value, decimals)
        .map(|d| d.normalize())
        .map_err(|e| crate::Error::Overflow(format!("{} with {} decimals: {}", amount, decimals, e)))
}
