//! Error types for store operations.

use crate::source::FairValueSource;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or changing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Attempt to record a value that is not a finite positive number
    #[error("Invalid fair value {value} for {ticker} from {source_name}: must be positive")]
    InvalidValue {
        /// Source the value was meant for
        source_name: FairValueSource,
        /// Ticker the value was meant for
        ticker: String,
        /// Rejected value
        value: f64,
    },

    /// Empty or blank ticker
    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    /// Priority order is not a permutation of the three sources
    #[error("Invalid priority order: {0}")]
    PriorityInvalid(String),

    /// Unknown source name
    #[error("Unknown fair value source '{0}' (expected dcf, manual or analyst)")]
    UnknownSource(String),

    /// Persisted document failed structural validation
    #[error("Corrupt fair value config {}: {reason}", path.display())]
    ConfigCorrupt {
        /// Document that failed to load
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
