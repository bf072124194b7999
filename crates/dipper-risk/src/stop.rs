//! Emergency stop latch.
//!
//! Once triggered the latch stays triggered until an operator resets it;
//! a second trigger keeps the original reason. Teardown listeners await
//! `cancelled()` instead of polling.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Why the session was stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Account balance fell below the fixated baseline by more than the
    /// configured threshold.
    DrawdownBreached {
        balance: Decimal,
        baseline: Decimal,
    },
    /// Operator-initiated stop.
    Manual { message: String },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DrawdownBreached { balance, baseline } => {
                write!(f, "Drawdown breached: balance {balance}, baseline {baseline}")
            }
            Self::Manual { message } => write!(f, "Manual: {message}"),
        }
    }
}

/// Trigger-once emergency stop.
///
/// Thread-safe; share via `Arc<EmergencyStopLatch>`.
pub struct EmergencyStopLatch {
    triggered: AtomicBool,
    reason: RwLock<Option<StopReason>>,
    token: CancellationToken,
}

impl Default for EmergencyStopLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EmergencyStopLatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            triggered: AtomicBool::new(false),
            reason: RwLock::new(None),
            token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Trigger the stop. A no-op when already triggered; the first
    /// reason wins.
    pub fn trigger(&self, reason: StopReason) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            {
                let mut guard = self.reason.write();
                *guard = Some(reason.clone());
            }
            error!(reason = %reason, "EMERGENCY STOP TRIGGERED");
            self.token.cancel();
        } else {
            warn!(new_reason = %reason, "Emergency stop already triggered, ignoring");
        }
    }

    /// The reason for the stop, when triggered.
    #[must_use]
    pub fn reason(&self) -> Option<StopReason> {
        if self.is_triggered() {
            self.reason.read().clone()
        } else {
            None
        }
    }

    /// Resolves when the latch triggers. Already-triggered latches
    /// resolve immediately.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Child token for wiring engine teardown to the latch.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Operator reset after the underlying issue is resolved.
    ///
    /// The cancellation token stays cancelled: a stopped session needs
    /// an external restart, the reset only re-arms the latch state for
    /// the next one.
    pub fn reset(&self) {
        if self.is_triggered() {
            let reason = self.reason.read().clone();
            info!(previous_reason = ?reason, "Emergency stop manually reset");
            self.triggered.store(false, Ordering::SeqCst);
            *self.reason.write() = None;
        }
    }
}
