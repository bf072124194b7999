//! Account drawdown guard.
//!
//! Compares the realized-plus-unrealized balance against a fixated
//! baseline and trips the emergency stop when it falls more than an
//! absolute threshold below it. The baseline fixates on the first
//! observed balance unless an operator pins it explicitly.

use crate::stop::{EmergencyStopLatch, StopReason};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Blunt account-level circuit breaker.
pub struct DrawdownGuard {
    latch: Arc<EmergencyStopLatch>,
    /// Maximum tolerated drop below the baseline, in quote units.
    max_drawdown: Decimal,
    baseline: RwLock<Option<Decimal>>,
}

impl DrawdownGuard {
    pub fn new(latch: Arc<EmergencyStopLatch>, max_drawdown: Decimal) -> Self {
        Self {
            latch,
            max_drawdown,
            baseline: RwLock::new(None),
        }
    }

    /// Pin the baseline explicitly.
    pub fn fixate(&self, balance: Decimal) {
        debug!(%balance, "Drawdown baseline fixated");
        *self.baseline.write() = Some(balance);
    }

    #[must_use]
    pub fn baseline(&self) -> Option<Decimal> {
        *self.baseline.read()
    }

    /// Check the balance against the baseline, fixating it first if
    /// none is set yet. Returns true when the breaker tripped.
    pub fn check(&self, balance: Decimal) -> bool {
        let baseline = {
            let mut guard = self.baseline.write();
            *guard.get_or_insert(balance)
        };

        if balance - baseline <= -self.max_drawdown {
            self.latch.trigger(StopReason::DrawdownBreached { balance, baseline });
            return true;
        }
        false
    }
}
