//! Price oracle adapter
//!
//! The pool reads one exchange rate per valuation and uses only
//! [`RoundData::rate`]. Round age and round id are not validated; a stale
//! feed values collateral at its stale rate.

use crate::types::{Amount, RoundData};
use crate::Result;
use chrono::Utc;
use parking_lot::RwLock;

/// Source of the collateral/settlement exchange rate
pub trait PriceOracle: Send + Sync {
    /// Latest round published by the feed
    fn latest_round(&self) -> Result<RoundData>;
}

/// Oracle with an operator-controlled rate.
///
/// Each [`set_rate`](FixedPriceOracle::set_rate) publishes a new round.
#[derive(Debug)]
pub struct FixedPriceOracle {
    round: RwLock<RoundData>,
}

impl FixedPriceOracle {
    /// Create oracle publishing `rate` as round 1
    pub fn new(rate: Amount) -> Self {
        Self {
            round: RwLock::new(RoundData {
                rate,
                updated_at: Utc::now(),
                round_id: 1,
            }),
        }
    }

    /// Publish a new rate
    pub fn set_rate(&self, rate: Amount) {
        let mut round = self.round.write();
        round.rate = rate;
        round.round_id += 1;
        round.updated_at = Utc::now();
        tracing::debug!(rate, round_id = round.round_id, "Oracle rate updated");
    }

    /// Current rate
    pub fn rate(&self) -> Amount {
        self.round.read().rate
    }
}

impl PriceOracle for FixedPriceOracle {
    fn latest_round(&self) -> Result<RoundData> {
        Ok(self.round.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_rate_bumps_round() {
        let oracle = FixedPriceOracle::new(1_000);
        let first = oracle.latest_round().unwrap();
        assert_eq!(first.round_id, 1);

        oracle.set_rate(2_000);
        let second = oracle.latest_round().unwrap();
        assert_eq!(second.rate, 2_000);
        assert_eq!(oracle.rate(), 2_000);
        assert_eq!(second.round_id, 2);
        assert!(second.updated_at >= first.updated_at);
    }
}
