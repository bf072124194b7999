//! Error types for dipper-bot.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Feed(#[from] dipper_feed::FeedError),

    #[error(transparent)]
    Engine(#[from] dipper_engine::EngineError),

    /// The drawdown breaker fired. The session is over; restart
    /// externally after investigating.
    #[error("Emergency stop: {0}")]
    EmergencyStop(String),
}

/// Result type alias for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
