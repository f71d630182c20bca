//! Pool notifications and the hash-chained event journal
//!
//! Every successful state transition emits exactly one notification. The
//! journal links each entry to its predecessor through a SHA-256 hash so an
//! exported or persisted history can be checked for tampering.

use crate::types::{AccountId, Amount};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// Settlement asset added to the pool by a lender
    EthLent = 1,
    /// Lender withdrawal. No operation emits it: lenders have no withdrawal path.
    EthWithdrawn = 2,
    /// Collateral posted
    CollateralDeposited = 3,
    /// Settlement asset borrowed
    EthBorrowed = 4,
    /// Loan repaid in full
    LoanRepaid = 5,
    /// Collateral returned to its owner
    CollateralWithdrawn = 6,
}

impl EventKind {
    /// Event name as published to indexers
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::EthLent => "EthLent",
            EventKind::EthWithdrawn => "EthWithdrawn",
            EventKind::CollateralDeposited => "CollateralDeposited",
            EventKind::EthBorrowed => "EthBorrowed",
            EventKind::LoanRepaid => "LoanRepaid",
            EventKind::CollateralWithdrawn => "CollateralWithdrawn",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvent {
    /// Position in the journal, starting at 0
    pub sequence: u64,

    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Notification kind
    pub kind: EventKind,

    /// Account the notification concerns
    pub account: AccountId,

    /// Amount carried by the notification
    pub amount: Amount,

    /// Emission time
    pub timestamp: DateTime<Utc>,

    /// Hash of the previous entry (zeroes for the first)
    pub previous_hash: [u8; 32],

    /// Hash of this entry
    pub hash: [u8; 32],
}

impl PoolEvent {
    /// Compute entry hash over every field except `hash`
    pub fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.event_id.as_bytes());
        hasher.update([self.kind as u8]);
        hasher.update((self.account.as_str().len() as u64).to_be_bytes());
        hasher.update(self.account.as_str().as_bytes());
        hasher.update(self.amount.to_be_bytes());
        hasher.update(self.timestamp.timestamp_nanos_opt().unwrap_or(0).to_be_bytes());
        hasher.update(self.previous_hash);

        hasher.finalize().into()
    }
}

/// Append-only notification log
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    events: Vec<PoolEvent>,
}

impl EventJournal {
    /// Create empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries, verifying the chain
    pub fn from_events(events: Vec<PoolEvent>) -> Result<Self> {
        let journal = Self { events };
        journal.verify_chain()?;
        Ok(journal)
    }

    /// Append a notification and return it
    pub fn record(&mut self, kind: EventKind, account: &AccountId, amount: Amount) -> &PoolEvent {
        let previous_hash = self.events.last().map(|e| e.hash).unwrap_or([0u8; 32]);

        let mut event = PoolEvent {
            sequence: self.events.len() as u64,
            event_id: Uuid::now_v7(),
            kind,
            account: account.clone(),
            amount,
            timestamp: Utc::now(),
            previous_hash,
            hash: [0u8; 32],
        };
        event.hash = event.compute_hash();

        tracing::info!(
            event = kind.name(),
            account = %account,
            amount,
            sequence = event.sequence,
            "Pool event emitted"
        );

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// All entries in emission order
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Entries concerning `account`
    pub fn events_for<'a>(&'a self, account: &'a AccountId) -> impl Iterator<Item = &'a PoolEvent> + 'a {
        self.events.iter().filter(move |e| &e.account == account)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Journal has no entries
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check sequence numbers, hashes and links
    pub fn verify_chain(&self) -> Result<()> {
        let mut previous_hash = [0u8; 32];

        for (index, event) in self.events.iter().enumerate() {
            if event.sequence != index as u64 {
                return Err(Error::JournalCorrupted(format!(
                    "entry {} has sequence {}",
                    index, event.sequence
                )));
            }
            if event.previous_hash != previous_hash {
                return Err(Error::JournalCorrupted(format!(
                    "entry {} does not link to its predecessor",
                    index
                )));
            }
            if event.compute_hash() != event.hash {
                return Err(Error::JournalCorrupted(format!(
                    "entry {} hash mismatch",
                    index
                )));
            }
            previous_hash = event.hash;
        }

        Ok(())
    }

    /// Export as newline-delimited JSON for external indexers
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for event in &self.events {
            let line = serde_json::to_string(event)
                .map_err(|e| Error::Storage(format!("Failed to encode event: {}", e)))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}
