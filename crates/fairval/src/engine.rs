//! Fair value engine.
//!
//! [`FairValueEngine`] ties the fallback-chain resolver to the persisted
//! store. It exposes the four operations callers need (compute, record,
//! resolve, re-prioritise) and a scan that values a whole universe and
//! replaces the `dcf` source with that cycle's results in one write, so a
//! ticker that could not be valued this cycle drops out of the ranking.

use fairval_data::{DataError, FundamentalsProvider, FundamentalsSnapshot, Quote};
use fairval_output::{Ranking, SkipReason, SkippedTicker, rank};
use fairval_store::{EffectiveValue, FairValueSource, FairValueStore, StoreError};
use fairval_valuation::{FairValueResolver, NotComputableError, ValuationResult, value_batch};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Store rejected or failed the operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every valuation method failed
    #[error(transparent)]
    NotComputable(#[from] NotComputableError),
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    /// Valued tickers, in scan order
    pub valued: Vec<ValuationResult>,
    /// Tickers that could not be fetched or valued, sorted by ticker
    pub skipped: Vec<SkippedTicker>,
}

impl ScanReport {
    /// Computed values keyed by ticker.
    pub fn values(&self) -> BTreeMap<String, f64> {
        self.valued
            .iter()
            .map(|r| (r.ticker.clone(), r.fair_value_per_share))
            .collect()
    }

    /// Number of tickers processed.
    pub fn len(&self) -> usize {
        self.valued.len() + self.skipped.len()
    }

    /// Whether nothing was processed.
    pub fn is_empty(&self) -> bool {
        self.valued.is_empty() && self.skipped.is_empty()
    }
}

/// Resolver plus store.
#[derive(Debug)]
pub struct FairValueEngine {
    resolver: FairValueResolver,
    store: FairValueStore,
}

impl FairValueEngine {
    /// Create an engine.
    pub const fn new(resolver: FairValueResolver, store: FairValueStore) -> Self {
        Self { resolver, store }
    }

    /// The resolver.
    pub const fn resolver(&self) -> &FairValueResolver {
        &self.resolver
    }

    /// The store.
    pub const fn store(&self) -> &FairValueStore {
        &self.store
    }

    /// Value one snapshot through its method chain. Nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`NotComputableError`] when every method in the chain fails.
    pub fn compute_fair_value(
        &self,
        snapshot: &FundamentalsSnapshot,
    ) -> Result<ValuationResult, NotComputableError> {
        self.resolver.resolve(snapshot)
    }

    /// Record a value for one source and ticker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidValue`] for a non-positive value, in which
    /// case the store is unchanged.
    pub fn record_fair_value(
        &self,
        source: FairValueSource,
        ticker: &str,
        value: f64,
    ) -> Result<(), StoreError> {
        self.store.set(source, ticker, value)
    }

    /// Effective value for a ticker under the current priority order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfigCorrupt`] if the stored document is
    /// invalid.
    pub fn resolve_effective_fair_value(
        &self,
        ticker: &str,
    ) -> Result<Option<EffectiveValue>, StoreError> {
        self.store.resolve(ticker)
    }

    /// Replace the priority order from source names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PriorityInvalid`] unless `order` names each
    /// source exactly once; the previous order stays in force.
    pub fn set_priority<S: AsRef<str>>(&self, order: &[S]) -> Result<(), StoreError> {
        self.store.set_priority_names(order)
    }

    /// Compute a snapshot's value and record it as `dcf`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotComputable`] if no method succeeds (nothing
    /// is written) or [`EngineError::Store`] if the write fails.
    pub fn value_and_record(
        &self,
        snapshot: &FundamentalsSnapshot,
    ) -> Result<ValuationResult, EngineError> {
        let result = self.compute_fair_value(snapshot)?;
        self.store
            .set(FairValueSource::Dcf, &result.ticker, result.fair_value_per_share)?;
        Ok(result)
    }

    /// Fetch, value and record every ticker.
    ///
    /// # Errors
    ///
    /// Only store failures are errors; fetch and valuation failures are
    /// reported per ticker in [`ScanReport::skipped`].
    pub fn scan<P>(&self, provider: &P, tickers: &[String]) -> Result<ScanReport, EngineError>
    where
        P: FundamentalsProvider + ?Sized,
    {
        let mut snapshots = Vec::with_capacity(tickers.len());
        let mut fetch_skips = Vec::new();
        for (ticker, fetched) in provider.fetch_batch(tickers) {
            match fetched {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => fetch_skips.push(fetch_skip(ticker, &e)),
            }
        }
        self.scan_snapshots(&snapshots, fetch_skips)
    }

    /// Value already-fetched snapshots in parallel without recording
    /// anything. `fetch_skips` carries tickers the caller could not fetch so
    /// they show up in the report.
    pub fn evaluate(
        &self,
        snapshots: &[FundamentalsSnapshot],
        fetch_skips: Vec<SkippedTicker>,
    ) -> ScanReport {
        let outcome = value_batch(&self.resolver, snapshots);

        let mut skipped = fetch_skips;
        skipped.extend(outcome.failed.into_iter().map(|e| {
            let reason = SkipReason::NotComputable(e.to_string());
            SkippedTicker::new(e.ticker, reason)
        }));
        skipped.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        ScanReport {
            valued: outcome.valued,
            skipped,
        }
    }

    /// [`evaluate`](Self::evaluate), then replace the `dcf` source with the
    /// computed values in a single write. Tickers skipped this cycle lose any
    /// `dcf` value from an earlier one; `manual` and `analyst` are untouched.
    /// An empty scan writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the write fails.
    pub fn scan_snapshots(
        &self,
        snapshots: &[FundamentalsSnapshot],
        fetch_skips: Vec<SkippedTicker>,
    ) -> Result<ScanReport, EngineError> {
        let report = self.evaluate(snapshots, fetch_skips);
        if !report.is_empty() {
            self.store.replace_source(FairValueSource::Dcf, &report.values())?;
        }
        info!(
            valued = report.valued.len(),
            skipped = report.skipped.len(),
            "Scan complete"
        );
        Ok(report)
    }

    /// Rank quoted tickers against their effective fair values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfigCorrupt`] if the stored document is
    /// invalid.
    pub fn rank(&self, quotes: &[Quote]) -> Result<Ranking, EngineError> {
        let combined = self.store.combined()?;
        Ok(rank(quotes, &combined))
    }

    /// [`rank`](Self::rank), with the scan's fetch and valuation failures
    /// reported in place of the generic "no fair value" reason.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfigCorrupt`] if the stored document is
    /// invalid.
    pub fn rank_scan(&self, quotes: &[Quote], report: &ScanReport) -> Result<Ranking, EngineError> {
        Ok(self.rank(quotes)?.with_skipped(report.skipped.iter().cloned()))
    }
}

/// Skip entry for a ticker the provider could not serve.
pub fn fetch_skip(ticker: impl Into<String>, error: &DataError) -> SkippedTicker {
    let ticker = ticker.into();
    warn!(ticker = %ticker, error = %error, "Fetch failed");
    SkippedTicker::new(ticker, SkipReason::FetchFailed(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fairval_data::InMemoryProvider;
    use fairval_store::PriorityOrder;
    use fairval_valuation::{SectorClassifier, SectorTable, ValuationConfig, ValuationMethod};

    fn engine(dir: &tempfile::TempDir) -> FairValueEngine {
        let resolver = FairValueResolver::new(
            SectorClassifier::new(SectorTable::gics_financials()),
            ValuationConfig::default(),
        );
        FairValueEngine::new(resolver, FairValueStore::open(dir.path().join("fv.json")))
    }

    fn multiple_only(ticker: &str) -> FundamentalsSnapshot {
        FundamentalsSnapshot::builder(ticker, 10.0)
            .trailing_eps(2.0)
            .sector_median_pe(15.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_compute_does_not_record() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        let result = engine.compute_fair_value(&multiple_only("X")).unwrap();
        assert_eq!(result.method_used, ValuationMethod::Multiple);
        assert_relative_eq!(result.fair_value_per_share, 30.0);
        assert_eq!(engine.resolve_effective_fair_value("X").unwrap(), None);
    }

    #[test]
    fn test_value_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        engine.value_and_record(&multiple_only("X")).unwrap();
        let effective = engine.resolve_effective_fair_value("X").unwrap().unwrap();
        assert_eq!(effective.source, FairValueSource::Dcf);
        assert_relative_eq!(effective.value, 30.0);
    }

    #[test]
    fn test_not_computable_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        let bare = FundamentalsSnapshot::builder("BARE", 10.0).build().unwrap();
        let err = engine.value_and_record(&bare).unwrap_err();
        assert!(matches!(err, EngineError::NotComputable(_)));
        assert!(!engine.store().path().exists());
    }

    #[test]
    fn test_priority_through_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        engine.record_fair_value(FairValueSource::Dcf, "X", 10.0).unwrap();
        engine.record_fair_value(FairValueSource::Manual, "X", 12.0).unwrap();
        assert_eq!(engine.resolve_effective_fair_value("X").unwrap().unwrap().value, 12.0);

        engine.set_priority(&["dcf", "manual", "analyst"]).unwrap();
        assert_eq!(engine.resolve_effective_fair_value("X").unwrap().unwrap().value, 10.0);

        assert!(engine.set_priority(&["dcf", "dcf", "manual"]).is_err());
        assert_eq!(
            engine.store().priority().unwrap(),
            PriorityOrder::from_names(&["dcf", "manual", "analyst"]).unwrap()
        );
    }

    #[test]
    fn test_scan_reports_every_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        let provider = InMemoryProvider::new(vec![
            multiple_only("A"),
            FundamentalsSnapshot::builder("B", 10.0).build().unwrap(),
        ]);
        let tickers = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let report = engine.scan(&provider, &tickers).unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.valued.len(), 1);
        assert_eq!(report.skipped[0].ticker, "B");
        assert!(matches!(report.skipped[0].reason, SkipReason::NotComputable(_)));
        assert_eq!(report.skipped[1].ticker, "C");
        assert!(matches!(report.skipped[1].reason, SkipReason::FetchFailed(_)));

        assert_eq!(engine.store().get(FairValueSource::Dcf, "A").unwrap(), Some(30.0));
        assert_eq!(engine.store().get(FairValueSource::Dcf, "B").unwrap(), None);
    }

    #[test]
    fn test_empty_scan_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        let report = engine.scan_snapshots(&[], Vec::new()).unwrap();
        assert!(report.is_empty());
        assert!(!engine.store().path().exists());
    }
}
