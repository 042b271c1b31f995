//! Ticker universes.
//!
//! The default scan universe is the AEX index. Any other list of tickers can
//! be loaded from a file with [`load_ticker_file`], which accepts:
//!
//! - a JSON array of tickers: `["ASML.AS", "INGA.AS"]`
//! - a JSON object holding such an array under `tickers` or `AEX_TICKERS`
//! - CSV with a `ticker` (or `symbol`) column, or a single unnamed column

pub mod aex;
pub mod gics;

pub use aex::{AexUniverse, Constituent};
pub use gics::GicsSector;

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Trait for ticker universes.
pub trait Universe {
    /// All symbols in the universe.
    fn symbols(&self) -> Vec<String>;

    /// Whether a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Number of constituents.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

impl Universe for AexUniverse {
    fn symbols(&self) -> Vec<String> {
        self.symbols()
    }

    fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }
}

/// Universe read from a ticker file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerList {
    symbols: Vec<String>,
}

impl TickerList {
    /// Create a list, trimming, uppercasing and de-duplicating while keeping
    /// first-seen order.
    pub fn new(symbols: impl IntoIterator<Item = String>) -> Self {
        let mut seen = BTreeSet::new();
        let symbols = symbols
            .into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        Self { symbols }
    }

    /// Load a list with [`load_ticker_file`].
    ///
    /// # Errors
    ///
    /// See [`load_ticker_file`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, UniverseError> {
        load_ticker_file(path).map(Self::new)
    }
}

impl Universe for TickerList {
    fn symbols(&self) -> Vec<String> {
        self.symbols.clone()
    }
}

/// Errors reading a ticker file.
#[derive(Debug, Error)]
pub enum UniverseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Parsed, but not one of the accepted layouts
    #[error("Unrecognized ticker file: {0}")]
    Format(String),
}

/// Read tickers from a JSON or CSV file.
///
/// Files ending in `.json` (or whose content starts with `[` or `{`) are
/// read as JSON; everything else as CSV.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no recognizable
/// ticker list.
pub fn load_ticker_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, UniverseError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let looks_like_json = path.extension().is_some_and(|ext| ext == "json")
        || contents.trim_start().starts_with(['[', '{']);

    let tickers = if looks_like_json {
        tickers_from_json(&contents)?
    } else {
        tickers_from_csv(contents.as_bytes())?
    };
    debug!(path = %path.display(), count = tickers.len(), "Loaded ticker file");
    Ok(tickers)
}

fn tickers_from_json(contents: &str) -> Result<Vec<String>, UniverseError> {
    let value: Value = serde_json::from_str(contents)?;
    let list = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match ["tickers", "AEX_TICKERS"].iter().find_map(|k| map.get(*k)) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(UniverseError::Format(
                    "expected a \"tickers\" or \"AEX_TICKERS\" array".to_string(),
                ));
            }
        },
        _ => {
            return Err(UniverseError::Format(
                "expected a JSON array or object".to_string(),
            ));
        }
    };

    list.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| UniverseError::Format(format!("ticker {} is not a string", item)))
        })
        .collect()
}

fn tickers_from_csv<R: std::io::Read>(reader: R) -> Result<Vec<String>, UniverseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut column = 0;
    let mut tickers = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        if idx == 0 {
            let header = record
                .iter()
                .position(|h| h.eq_ignore_ascii_case("ticker") || h.eq_ignore_ascii_case("symbol"));
            if let Some(pos) = header {
                column = pos;
                continue;
            }
        }
        if let Some(ticker) = record.get(column).filter(|t| !t.is_empty()) {
            tickers.push(ticker.to_string());
        }
    }
    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_universe_trait() {
        let universe = AexUniverse::new();
        assert!(universe.contains("ASML.AS"));
        assert!(!universe.contains("NOTREAL"));
        assert_eq!(universe.size(), 22);
    }

    #[rstest]
    #[case("t.json", r#"["ASML.AS", "INGA.AS"]"#)]
    #[case("t.json", r#"{"AEX_TICKERS": ["ASML.AS", "INGA.AS"]}"#)]
    #[case("t.txt", r#"{"tickers": ["ASML.AS", "INGA.AS"]}"#)]
    #[case("t.csv", "ticker,name\nASML.AS,ASML\nINGA.AS,ING\n")]
    #[case("t.csv", "name,Symbol\nASML,ASML.AS\nING,INGA.AS\n")]
    #[case("t.csv", "ASML.AS\nINGA.AS\n\n")]
    fn test_ticker_file_layouts(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, name, contents);
        assert_eq!(load_ticker_file(&path).unwrap(), vec!["ASML.AS", "INGA.AS"]);
    }

    #[rstest]
    #[case(r#"{"symbols": ["ASML.AS"]}"#)]
    #[case(r#"["ASML.AS", 42]"#)]
    #[case("42")]
    fn test_rejects_unknown_json(#[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.json", contents);
        assert!(matches!(load_ticker_file(&path), Err(UniverseError::Format(_))));
    }

    #[test]
    fn test_ticker_list_normalizes() {
        let list = TickerList::new(vec![
            " asml.as ".to_string(),
            "INGA.AS".to_string(),
            "ASML.AS".to_string(),
            String::new(),
        ]);
        assert_eq!(list.symbols(), vec!["ASML.AS", "INGA.AS"]);
        assert!(list.contains("INGA.AS"));
        assert_eq!(list.size(), 2);
    }
}
