//! Fundamentals provider boundary.
//!
//! The engine never talks to a data vendor directly. Anything that can turn a
//! ticker into a [`FundamentalsSnapshot`] implements [`FundamentalsProvider`];
//! retry and rate limiting are the provider's business.

use crate::error::{DataError, Result};
use crate::snapshot::FundamentalsSnapshot;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of per-company fundamentals.
pub trait FundamentalsProvider: Send + Sync {
    /// Fetch the snapshot for a single ticker.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Fetch`] when the provider has nothing usable for
    /// the ticker.
    fn fetch(&self, ticker: &str) -> Result<FundamentalsSnapshot>;

    /// Fetch snapshots for several tickers, keeping each outcome separate.
    fn fetch_batch(&self, tickers: &[String]) -> Vec<(String, Result<FundamentalsSnapshot>)> {
        tickers
            .iter()
            .map(|t| (t.clone(), self.fetch(t)))
            .collect()
    }
}

/// Provider backed by a fixed set of snapshots held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    snapshots: HashMap<String, FundamentalsSnapshot>,
}

impl InMemoryProvider {
    /// Create a provider from snapshots, keyed by their tickers.
    pub fn new(snapshots: impl IntoIterator<Item = FundamentalsSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|s| (s.ticker.clone(), s))
                .collect(),
        }
    }

    /// Tickers this provider can serve, sorted.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.snapshots.keys().cloned().collect();
        tickers.sort();
        tickers
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the provider holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FundamentalsProvider for InMemoryProvider {
    fn fetch(&self, ticker: &str) -> Result<FundamentalsSnapshot> {
        let snapshot = self
            .snapshots
            .get(ticker)
            .ok_or_else(|| DataError::fetch(ticker, "no snapshot available"))?;
        snapshot.validate()?;
        Ok(snapshot.clone())
    }
}

/// Provider that reads a JSON array of snapshots exported by an upstream
/// fetcher.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
    inner: InMemoryProvider,
}

impl JsonFileProvider {
    /// Load all snapshots from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// snapshots. Individual snapshots are validated lazily on `fetch`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path)?;
        let snapshots: Vec<FundamentalsSnapshot> = serde_json::from_str(&contents)?;
        tracing::debug!(path = %path.display(), count = snapshots.len(), "Loaded snapshots");

        Ok(Self {
            path,
            inner: InMemoryProvider::new(snapshots),
        })
    }

    /// Path the snapshots were read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tickers present in the file, sorted.
    pub fn tickers(&self) -> Vec<String> {
        self.inner.tickers()
    }
}

impl FundamentalsProvider for JsonFileProvider {
    fn fetch(&self, ticker: &str) -> Result<FundamentalsSnapshot> {
        self.inner.fetch(ticker)
    }
}
