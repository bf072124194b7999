//! Error types for dipper-risk.

use thiserror::Error;

/// Risk control error types.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid drawdown threshold: {0}")]
    InvalidThreshold(String),
}

/// Result type alias for risk operations.
pub type RiskResult<T> = std::result::Result<T, RiskError>;
