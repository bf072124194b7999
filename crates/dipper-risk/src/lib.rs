//! Account-level risk controls.
//!
//! Provides the emergency stop latch (trigger-once, operator-reset) and
//! the drawdown guard that trips it when the account balance falls too
//! far below a fixated baseline. The breaker is deliberately blunt: it
//! tears down every symbol engine, not just the offender.

pub mod drawdown;
pub mod error;
pub mod stop;

pub use drawdown::DrawdownGuard;
pub use error::{RiskError, RiskResult};
pub use stop::{EmergencyStopLatch, StopReason};
