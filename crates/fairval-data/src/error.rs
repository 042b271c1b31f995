//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building or fetching fundamentals.
#[derive(Debug, Error)]
pub enum DataError {
    /// Provider could not supply a snapshot for the ticker
    #[error("Fetch failed for {ticker}: {reason}")]
    Fetch {
        /// Ticker that was requested
        ticker: String,
        /// Reason reported by the provider
        reason: String,
    },

    /// Snapshot field failed validation
    #[error("Invalid snapshot for {ticker}: {reason}")]
    InvalidSnapshot {
        /// Ticker of the rejected snapshot
        ticker: String,
        /// Which constraint was violated
        reason: String,
    },

    /// Invalid ticker
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for a provider fetch failure.
    pub fn fetch(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }
}
