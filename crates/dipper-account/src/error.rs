//! Error types for dipper-account.

use thiserror::Error;

/// Account/reconciliation error types.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The drawdown breaker fired; the session must be restarted
    /// externally.
    #[error("Emergency stop: {0}")]
    EmergencyStop(String),
}

/// Result type alias for account operations.
pub type AccountResult<T> = std::result::Result<T, AccountError>;
