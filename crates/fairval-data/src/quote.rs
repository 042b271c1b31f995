//! Last-price quotes used to rank tickers against their fair value.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Latest market quote for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker identifier
    pub ticker: String,
    /// Company short name
    #[serde(default)]
    pub name: Option<String>,
    /// Last traded price
    pub price: f64,
    /// Shares outstanding
    pub shares_outstanding: f64,
}

impl Quote {
    /// Create a new quote.
    pub fn new(ticker: impl Into<String>, price: f64, shares_outstanding: f64) -> Self {
        Self {
            ticker: ticker.into(),
            name: None,
            price,
            shares_outstanding,
        }
    }

    /// Market capitalization at the quoted price.
    pub fn market_cap(&self) -> f64 {
        self.price * self.shares_outstanding
    }
}

/// Load a JSON array of quotes from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if it holds
/// a quote with an empty ticker.
pub fn load_quotes<P: AsRef<Path>>(path: P) -> Result<Vec<Quote>> {
    let contents = std::fs::read_to_string(path)?;
    let quotes: Vec<Quote> = serde_json::from_str(&contents)?;
    if let Some(q) = quotes.iter().find(|q| q.ticker.trim().is_empty()) {
        return Err(DataError::InvalidTicker(format!(
            "Quote with empty ticker (price {})",
            q.price
        )));
    }
    Ok(quotes)
}
