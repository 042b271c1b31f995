//! Parallel valuation of many snapshots.
//!
//! Valuation is a pure function of its snapshot, so tickers are spread over
//! the rayon pool without coordination. A failure for one ticker never
//! affects another.

use crate::error::NotComputableError;
use crate::resolver::FairValueResolver;
use crate::result::ValuationResult;
use fairval_data::FundamentalsSnapshot;
use rayon::prelude::*;
use tracing::info;

/// Outcome of a batch, in input order within each list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Successful valuations
    pub valued: Vec<ValuationResult>,
    /// Tickers for which every method failed
    pub failed: Vec<NotComputableError>,
}

impl BatchOutcome {
    /// Total number of snapshots processed.
    pub fn len(&self) -> usize {
        self.valued.len() + self.failed.len()
    }

    /// Whether the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.valued.is_empty() && self.failed.is_empty()
    }
}

/// Value every snapshot in parallel.
pub fn value_batch(resolver: &FairValueResolver, snapshots: &[FundamentalsSnapshot]) -> BatchOutcome {
    let results: Vec<Result<ValuationResult, NotComputableError>> = snapshots
        .par_iter()
        .map(|snapshot| resolver.resolve(snapshot))
        .collect();

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(valued) => outcome.valued.push(valued),
            Err(failed) => outcome.failed.push(failed),
        }
    }

    info!(
        valued = outcome.valued.len(),
        failed = outcome.failed.len(),
        "Batch valuation complete"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_preserved_and_failures_isolated() {
        let snapshots: Vec<_> = (0..50)
            .map(|i| {
                let builder = FundamentalsSnapshot::builder(format!("T{i:02}"), 10.0);
                // Every third ticker has nothing to value
                if i % 3 == 0 {
                    builder.build().unwrap()
                } else {
                    builder.free_cash_flow(100.0 + f64::from(i)).build().unwrap()
                }
            })
            .collect();

        let outcome = value_batch(&FairValueResolver::default(), &snapshots);
        assert_eq!(outcome.len(), 50);
        assert_eq!(outcome.failed.len(), 17);

        let tickers: Vec<_> = outcome.valued.iter().map(|r| r.ticker.as_str()).collect();
        let mut sorted = tickers.clone();
        sorted.sort_unstable();
        assert_eq!(tickers, sorted);
        assert!(outcome.failed.iter().all(|e| e.attempts.len() == 2));
    }

    #[test]
    fn test_empty_batch() {
        let outcome = value_batch(&FairValueResolver::default(), &[]);
        assert!(outcome.is_empty());
    }
}
