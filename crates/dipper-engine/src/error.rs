//! Error types for dipper-engine.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Order submission was rejected or the connection was lost. The
    /// gate has already reverted to idle; nothing is retried.
    #[error("Order transport failure: {0}")]
    Transport(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Submission was attempted before any tick seeded a price.
    #[error("No market price observed yet")]
    NoPrice,
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
