#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod provider;
pub mod quote;
pub mod snapshot;

pub use error::{DataError, Result};
pub use provider::{FundamentalsProvider, InMemoryProvider, JsonFileProvider};
pub use quote::{Quote, load_quotes};
pub use snapshot::{FundamentalsSnapshot, SnapshotBuilder};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
