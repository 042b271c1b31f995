//! Migration from the single-source files that predate the store.
//!
//! Two layouts exist: DCF results wrapped as `{"values": {ticker: value}}`
//! and analyst targets as a flat `{ticker: value}` map. Entries that are not
//! positive numbers are skipped rather than failing the whole import.

use crate::document::is_valid_value;
use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Values read from a legacy file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyImport {
    /// Usable values
    pub values: BTreeMap<String, f64>,
    /// Tickers whose value was unusable
    pub skipped: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WrappedValues {
    values: BTreeMap<String, serde_json::Value>,
}

/// Read a `{"values": {...}}` DCF file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not that shape.
pub fn read_wrapped<P: AsRef<Path>>(path: P) -> Result<LegacyImport> {
    let contents = std::fs::read_to_string(path)?;
    let wrapped: WrappedValues = serde_json::from_str(&contents)?;
    Ok(sanitize(wrapped.values))
}

/// Read a flat `{ticker: value}` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON object.
pub fn read_flat<P: AsRef<Path>>(path: P) -> Result<LegacyImport> {
    let contents = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&contents)?;
    Ok(sanitize(raw))
}

fn sanitize(raw: BTreeMap<String, serde_json::Value>) -> LegacyImport {
    let mut import = LegacyImport::default();
    for (ticker, value) in raw {
        match value.as_f64().filter(|v| is_valid_value(*v)) {
            Some(v) if !ticker.trim().is_empty() => {
                import.values.insert(ticker.trim().to_string(), v);
            }
            _ => {
                warn!(ticker = %ticker, value = %value, "Skipping unusable legacy fair value");
                import.skipped.push(ticker);
            }
        }
    }
    import
}
