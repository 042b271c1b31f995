//! Export functionality for rankings and valuation results.
//!
//! CSV output is one flat row per ticker; JSON output keeps the full
//! structure, including skipped tickers and diagnostics.

use crate::ranking::{RankedTicker, Ranking};
use fairval_valuation::ValuationResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Flat view of a [`ValuationResult`] for tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    /// Ticker identifier
    pub ticker: String,
    /// Estimated fair value per share
    pub fair_value_per_share: f64,
    /// Method identifier
    pub method: String,
    /// Failed methods before the winning one, `;`-separated
    pub fallbacks: String,
}

impl From<&ValuationResult> for ValuationRecord {
    fn from(result: &ValuationResult) -> Self {
        Self {
            ticker: result.ticker.clone(),
            fair_value_per_share: result.fair_value_per_share,
            method: result.method_used.id().to_string(),
            fallbacks: result
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_rows<'a, T, I>(rows: I) -> Result<String, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for Vec<RankedTicker> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let rows: Vec<RankedRow<'_>> = self.iter().map(RankedRow::from).collect();
                csv_rows(&rows)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Ranking {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.ranked.export_to_string(format),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<ValuationResult> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let records: Vec<ValuationRecord> = self.iter().map(ValuationRecord::from).collect();
                csv_rows(&records)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// CSV row for a ranked ticker; the optional name becomes an empty cell.
#[derive(Debug, Serialize)]
struct RankedRow<'a> {
    rank: usize,
    ticker: &'a str,
    name: &'a str,
    price: f64,
    fair_value: f64,
    source: &'a str,
    market_cap: f64,
    fair_market_cap: f64,
    discount_margin: f64,
    discount_percent: f64,
}

impl<'a> From<&'a RankedTicker> for RankedRow<'a> {
    fn from(r: &'a RankedTicker) -> Self {
        Self {
            rank: r.rank,
            ticker: &r.ticker,
            name: r.name.as_deref().unwrap_or_default(),
            price: r.price,
            fair_value: r.fair_value,
            source: r.source.name(),
            market_cap: r.market_cap,
            fair_market_cap: r.fair_market_cap,
            discount_margin: r.discount_margin,
            discount_percent: r.discount_percent,
        }
    }
}
