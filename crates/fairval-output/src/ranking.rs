//! Ranking tickers by discount to fair value.
//!
//! For each ticker with both a quote and an effective fair value:
//!
//! ```text
//! market_cap       = price * shares
//! fair_market_cap  = fair_value * shares
//! discount_margin  = fair_market_cap - market_cap
//! discount_percent = discount_margin / fair_market_cap * 100
//! ```
//!
//! which reduces to `(fair - price) / fair * 100`. The most undervalued
//! ticker comes first.

use chrono::{DateTime, Utc};
use fairval_data::Quote;
use fairval_store::{EffectiveValue, FairValueSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

/// One ranked ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTicker {
    /// One-based position in the ranking
    pub rank: usize,
    /// Ticker identifier
    pub ticker: String,
    /// Company short name
    pub name: Option<String>,
    /// Last traded price
    pub price: f64,
    /// Effective fair value per share
    pub fair_value: f64,
    /// Source of the fair value
    pub source: FairValueSource,
    /// Market capitalisation at the quoted price
    pub market_cap: f64,
    /// Capitalisation at the fair value
    pub fair_market_cap: f64,
    /// Fair minus actual capitalisation
    pub discount_margin: f64,
    /// Discount as a percentage of the fair capitalisation
    pub discount_percent: f64,
}

/// Why a ticker was left out of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No source has a fair value for the ticker
    NoFairValue,
    /// No quote was supplied for the ticker
    NoQuote,
    /// Quoted price is zero, negative or not a number
    InvalidPrice(f64),
    /// Quoted share count is zero, negative or not a number
    InvalidShares(f64),
    /// Fundamentals could not be fetched
    FetchFailed(String),
    /// Every valuation method failed
    NotComputable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFairValue => write!(f, "no fair value from any source"),
            Self::NoQuote => write!(f, "no quote"),
            Self::InvalidPrice(p) => write!(f, "invalid price {}", p),
            Self::InvalidShares(s) => write!(f, "invalid shares outstanding {}", s),
            Self::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
            Self::NotComputable(reason) => write!(f, "not computable: {}", reason),
        }
    }
}

/// A ticker left out of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    /// Ticker identifier
    pub ticker: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

impl SkippedTicker {
    /// Create a new skipped entry.
    pub fn new(ticker: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            ticker: ticker.into(),
            reason,
        }
    }
}

/// Ranked and skipped tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// When the ranking was produced
    pub generated_at: DateTime<Utc>,
    /// Ranked tickers, most undervalued first
    pub ranked: Vec<RankedTicker>,
    /// Tickers that could not be ranked, sorted by ticker
    pub skipped: Vec<SkippedTicker>,
}

/// Rank quoted tickers against their effective fair values.
///
/// Tickers with a fair value but no quote, or a quote but no fair value,
/// are reported as skipped.
pub fn rank(quotes: &[Quote], fair_values: &BTreeMap<String, EffectiveValue>) -> Ranking {
    let mut ranked = Vec::new();
    let mut skipped = Vec::new();
    let mut quoted = BTreeSet::new();

    for quote in quotes {
        quoted.insert(quote.ticker.as_str());

        let Some(effective) = fair_values.get(&quote.ticker) else {
            skipped.push(SkippedTicker::new(&quote.ticker, SkipReason::NoFairValue));
            continue;
        };
        if !(quote.price.is_finite() && quote.price > 0.0) {
            skipped.push(SkippedTicker::new(&quote.ticker, SkipReason::InvalidPrice(quote.price)));
            continue;
        }
        let shares = quote.shares_outstanding;
        if !(shares.is_finite() && shares > 0.0) {
            skipped.push(SkippedTicker::new(&quote.ticker, SkipReason::InvalidShares(shares)));
            continue;
        }

        let market_cap = quote.market_cap();
        let fair_market_cap = effective.value * shares;
        let discount_margin = fair_market_cap - market_cap;
        let discount_percent = discount_margin / fair_market_cap * 100.0;
        debug!(ticker = %quote.ticker, discount_percent, "Ranked ticker");

        ranked.push(RankedTicker {
            rank: 0,
            ticker: quote.ticker.clone(),
            name: quote.name.clone(),
            price: quote.price,
            fair_value: effective.value,
            source: effective.source,
            market_cap,
            fair_market_cap,
            discount_margin,
            discount_percent,
        });
    }

    for ticker in fair_values.keys() {
        if !quoted.contains(ticker.as_str()) {
            skipped.push(SkippedTicker::new(ticker, SkipReason::NoQuote));
        }
    }

    ranked.sort_by(|a, b| {
        b.discount_percent
            .total_cmp(&a.discount_percent)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    for (idx, entry) in ranked.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }
    skipped.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    for entry in &skipped {
        warn!(ticker = %entry.ticker, reason = %entry.reason, "Ticker skipped from ranking");
    }

    Ranking {
        generated_at: Utc::now(),
        ranked,
        skipped,
    }
}

impl Ranking {
    /// Add skipped tickers produced upstream (fetch or valuation failures).
    ///
    /// An upstream reason replaces the one found while ranking. Tickers that
    /// were ranked anyway, through another source, stay ranked.
    pub fn with_skipped(mut self, extra: impl IntoIterator<Item = SkippedTicker>) -> Self {
        for entry in extra {
            if self.ranked.iter().any(|r| r.ticker == entry.ticker) {
                continue;
            }
            self.skipped.retain(|s| s.ticker != entry.ticker);
            self.skipped.push(entry);
        }
        self.skipped.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        self
    }

    /// The `n` most undervalued tickers.
    pub fn top(&self, n: usize) -> &[RankedTicker] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// Tickers trading below fair value.
    pub fn undervalued(&self) -> impl Iterator<Item = &RankedTicker> {
        self.ranked.iter().filter(|r| r.discount_percent > 0.0)
    }

    /// Render as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nFair Value Discount Ranking\n");
        output.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&"=".repeat(96));
        output.push('\n');

        output.push_str(&format!(
            "{:>4} {:<12} {:>10} {:>10} {:<8} {:>14} {:>14} {:>10}\n",
            "#", "Ticker", "Price", "Fair", "Source", "Mkt Cap (M)", "Fair Cap (M)", "Discount"
        ));
        output.push_str(&"-".repeat(96));
        output.push('\n');

        for r in &self.ranked {
            output.push_str(&format!(
                "{:>4} {:<12} {:>10.2} {:>10.2} {:<8} {:>14.1} {:>14.1} {:>9.2}%\n",
                r.rank,
                r.ticker,
                r.price,
                r.fair_value,
                r.source.name(),
                r.market_cap / 1_000_000.0,
                r.fair_market_cap / 1_000_000.0,
                r.discount_percent
            ));
        }

        if !self.skipped.is_empty() {
            output.push_str(&"-".repeat(96));
            output.push('\n');
            output.push_str(&format!("Skipped ({}):\n", self.skipped.len()));
            for s in &self.skipped {
                output.push_str(&format!("  {:<12} {}\n", s.ticker, s.reason));
            }
        }

        output.push_str(&"=".repeat(96));
        output.push('\n');
        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Fair Value Discount Ranking\n\n");
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output.push_str("| # | Ticker | Price | Fair Value | Source | Discount |\n");
        output.push_str("|--:|--------|------:|-----------:|--------|---------:|\n");
        for r in &self.ranked {
            output.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {} | {:.2}% |\n",
                r.rank,
                r.ticker,
                r.price,
                r.fair_value,
                r.source.name(),
                r.discount_percent
            ));
        }

        if !self.skipped.is_empty() {
            output.push_str("\n## Skipped\n\n");
            for s in &self.skipped {
                output.push_str(&format!("- **{}**: {}\n", s.ticker, s.reason));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn effective(value: f64, source: FairValueSource) -> EffectiveValue {
        EffectiveValue { value, source }
    }

    #[test]
    fn test_metrics() {
        let quotes = vec![Quote::new("X", 80.0, 1_000.0)];
        let values = BTreeMap::from([("X".to_string(), effective(100.0, FairValueSource::Dcf))]);
        let ranking = rank(&quotes, &values);

        let r = &ranking.ranked[0];
        assert_eq!(r.rank, 1);
        assert_relative_eq!(r.market_cap, 80_000.0);
        assert_relative_eq!(r.fair_market_cap, 100_000.0);
        assert_relative_eq!(r.discount_margin, 20_000.0);
        assert_relative_eq!(r.discount_percent, 20.0);
    }

    #[test]
    fn test_sorted_by_discount_descending() {
        let quotes = vec![
            Quote::new("OVER", 150.0, 10.0),
            Quote::new("CHEAP", 50.0, 10.0),
            Quote::new("FAIR", 100.0, 10.0),
        ];
        let values = BTreeMap::from([
            ("OVER".to_string(), effective(100.0, FairValueSource::Dcf)),
            ("CHEAP".to_string(), effective(100.0, FairValueSource::Manual)),
            ("FAIR".to_string(), effective(100.0, FairValueSource::Analyst)),
        ]);
        let ranking = rank(&quotes, &values);
        let order: Vec<_> = ranking.ranked.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["CHEAP", "FAIR", "OVER"]);
        assert_relative_eq!(ranking.ranked[2].discount_percent, -50.0);
        assert_eq!(ranking.undervalued().count(), 1);
        assert_eq!(ranking.top(10).len(), 3);
    }

    #[test]
    fn test_skip_reasons() {
        let quotes = vec![
            Quote::new("NOVALUE", 10.0, 10.0),
            Quote::new("BADPRICE", 0.0, 10.0),
            Quote::new("BADSHARES", 10.0, -1.0),
        ];
        let values = BTreeMap::from([
            ("BADPRICE".to_string(), effective(5.0, FairValueSource::Dcf)),
            ("BADSHARES".to_string(), effective(5.0, FairValueSource::Dcf)),
            ("NOQUOTE".to_string(), effective(5.0, FairValueSource::Dcf)),
        ]);
        let ranking = rank(&quotes, &values);
        assert!(ranking.ranked.is_empty());

        let reasons: Vec<_> = ranking
            .skipped
            .iter()
            .map(|s| (s.ticker.as_str(), s.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("BADPRICE", SkipReason::InvalidPrice(0.0)),
                ("BADSHARES", SkipReason::InvalidShares(-1.0)),
                ("NOQUOTE", SkipReason::NoQuote),
                ("NOVALUE", SkipReason::NoFairValue),
            ]
        );
    }

    #[test]
    fn test_upstream_reason_replaces_generic_one() {
        let quotes = vec![Quote::new("NN.AS", 40.0, 10.0), Quote::new("HEIA.AS", 75.0, 10.0)];
        let values = BTreeMap::from([(
            "HEIA.AS".to_string(),
            effective(100.0, FairValueSource::Manual),
        )]);
        let ranking = rank(&quotes, &values).with_skipped([
            SkippedTicker::new("NN.AS", SkipReason::NotComputable("no method".to_string())),
            SkippedTicker::new("HEIA.AS", SkipReason::NotComputable("no cash flow".to_string())),
            SkippedTicker::new("KPN.AS", SkipReason::FetchFailed("timeout".to_string())),
        ]);

        assert_eq!(ranking.ranked.len(), 1);
        assert_eq!(ranking.ranked[0].ticker, "HEIA.AS");
        let reasons: Vec<_> = ranking
            .skipped
            .iter()
            .map(|s| (s.ticker.as_str(), s.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("KPN.AS", SkipReason::FetchFailed("timeout".to_string())),
                ("NN.AS", SkipReason::NotComputable("no method".to_string())),
            ]
        );
    }

    #[test]
    fn test_ascii_and_markdown() {
        let quotes = vec![Quote::new("ASML.AS", 600.0, 393_000_000.0)];
        let values = BTreeMap::from([(
            "ASML.AS".to_string(),
            effective(750.0, FairValueSource::Manual),
        )]);
        let ranking = rank(&quotes, &values).with_skipped([SkippedTicker::new(
            "NN.AS",
            SkipReason::NotComputable("no method".to_string()),
        )]);

        let ascii = ranking.to_ascii_table();
        assert!(ascii.contains("ASML.AS"));
        assert!(ascii.contains("20.00%"));
        assert!(ascii.contains("NN.AS"));
        assert!(ascii.contains("not computable: no method"));

        let md = ranking.to_markdown();
        assert!(md.contains("# Fair Value Discount Ranking"));
        assert!(md.contains("| 1 | ASML.AS |"));
        assert!(md.contains("## Skipped"));
    }
}
