//! Error types for dipper-feed.

use thiserror::Error;

/// Feed error types.
#[derive(Debug, Error)]
pub enum FeedError {
    /// An unparseable stream element. Consumers log and drop it; the
    /// stream continues.
    #[error("Malformed stream element: {0}")]
    Malformed(String),

    #[error("No feed configured for symbol: {0}")]
    UnknownSymbol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for feed operations.
pub type FeedResult<T> = std::result::Result<T, FeedError>;
