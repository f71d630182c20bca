//! Reentrancy guard
//!
//! Adapters run inside pool operations and may call back into the pool on
//! the same thread. The guard is a per-pool flag taken on entry to every
//! mutating operation; a second entry while it is held fails with
//! [`Error::Reentrant`]. Release happens when the returned [`Entered`]
//! token drops, so every exit path clears it.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-instance reentrancy lock
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    /// Create released guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard for `operation`
    pub fn enter(&self, operation: &'static str) -> Result<Entered<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Reentrant { operation })?;

        Ok(Entered { guard: self })
    }

    /// An operation currently holds the guard
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Scoped hold on a [`ReentrancyGuard`]
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
