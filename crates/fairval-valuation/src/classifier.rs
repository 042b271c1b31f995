//! Company-type classification.
//!
//! The classification decides which method chain applies. It is driven by an
//! explicit [`SectorTable`] so the mapping can be reviewed and tested on its
//! own; nothing is inferred from financial ratios or free-text matching.

use fairval_data::FundamentalsSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Company type used to pick a method family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    /// Anything that is not a bank or insurer
    #[default]
    NonFinancial,
    /// Bank
    Bank,
    /// Insurance company
    Insurance,
}

impl CompanyType {
    /// Returns all company types.
    pub fn all() -> Vec<Self> {
        vec![Self::NonFinancial, Self::Bank, Self::Insurance]
    }

    /// Whether the company belongs to the financial sector.
    pub const fn is_financial(&self) -> bool {
        matches!(self, Self::Bank | Self::Insurance)
    }

    /// Identifier used in table files.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::NonFinancial => "non_financial",
            Self::Bank => "bank",
            Self::Insurance => "insurance",
        }
    }

    /// Parse a company type from its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.id() == id)
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NonFinancial => "Non-financial",
            Self::Bank => "Bank",
            Self::Insurance => "Insurance",
        };
        write!(f, "{}", name)
    }
}

/// Errors loading a sector table.
#[derive(Debug, Error)]
pub enum SectorTableError {
    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Row with an unknown key kind or company type
    #[error("Invalid sector table row {row}: {reason}")]
    InvalidRow {
        /// One-based data row number
        row: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// Lookup table from ticker or sector code to company type.
///
/// Ticker entries take precedence over sector entries. Tickers are matched
/// case-insensitively; sector codes are matched after trimming and
/// lowercasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorTable {
    #[serde(default)]
    tickers: HashMap<String, CompanyType>,
    #[serde(default)]
    sectors: HashMap<String, CompanyType>,
}

#[derive(Debug, Deserialize)]
struct SectorTableRow {
    kind: String,
    key: String,
    company_type: String,
}

impl SectorTable {
    /// Create an empty table; every lookup falls back to non-financial.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the GICS financial industry groups mapped.
    ///
    /// Banks are industry group 4010 and insurance is 4030; sector hints
    /// carrying those codes (or the plain names) are classified accordingly.
    pub fn gics_financials() -> Self {
        Self::new()
            .with_sector("4010", CompanyType::Bank)
            .with_sector("banks", CompanyType::Bank)
            .with_sector("4030", CompanyType::Insurance)
            .with_sector("insurance", CompanyType::Insurance)
    }

    /// Add or replace a ticker entry.
    pub fn with_ticker(mut self, ticker: &str, company_type: CompanyType) -> Self {
        self.insert_ticker(ticker, company_type);
        self
    }

    /// Add or replace a sector entry.
    pub fn with_sector(mut self, sector: &str, company_type: CompanyType) -> Self {
        self.insert_sector(sector, company_type);
        self
    }

    /// Add or replace a ticker entry in place.
    pub fn insert_ticker(&mut self, ticker: &str, company_type: CompanyType) {
        self.tickers.insert(normalize_ticker(ticker), company_type);
    }

    /// Add or replace a sector entry in place.
    pub fn insert_sector(&mut self, sector: &str, company_type: CompanyType) {
        self.sectors.insert(normalize_sector(sector), company_type);
    }

    /// Merge another table into this one; entries from `other` win.
    pub fn merge(&mut self, other: Self) {
        self.tickers.extend(other.tickers);
        self.sectors.extend(other.sectors);
    }

    /// Look up a ticker entry.
    pub fn ticker(&self, ticker: &str) -> Option<CompanyType> {
        self.tickers.get(&normalize_ticker(ticker)).copied()
    }

    /// Look up a sector entry.
    pub fn sector(&self, sector: &str) -> Option<CompanyType> {
        self.sectors.get(&normalize_sector(sector)).copied()
    }

    /// Number of entries (tickers and sectors).
    pub fn len(&self) -> usize {
        self.tickers.len() + self.sectors.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty() && self.sectors.is_empty()
    }

    /// Load a table from a JSON document `{"tickers": {...}, "sectors": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SectorTableError> {
        let contents = std::fs::read_to_string(path)?;
        let raw: Self = serde_json::from_str(&contents)?;
        // Re-insert so keys are normalized regardless of how the file spells them.
        let mut table = Self::new();
        for (ticker, ty) in raw.tickers {
            table.insert_ticker(&ticker, ty);
        }
        for (sector, ty) in raw.sectors {
            table.insert_sector(&sector, ty);
        }
        Ok(table)
    }

    /// Load a table from CSV with header `kind,key,company_type`, where
    /// `kind` is `ticker` or `sector`.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed CSV or an unknown kind or company type.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SectorTableError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut table = Self::new();

        for (idx, row) in rdr.deserialize::<SectorTableRow>().enumerate() {
            let row_no = idx + 1;
            let row = row?;
            let company_type = CompanyType::from_id(&row.company_type).ok_or_else(|| {
                SectorTableError::InvalidRow {
                    row: row_no,
                    reason: format!("unknown company type '{}'", row.company_type),
                }
            })?;
            match row.kind.as_str() {
                "ticker" => table.insert_ticker(&row.key, company_type),
                "sector" => table.insert_sector(&row.key, company_type),
                other => {
                    return Err(SectorTableError::InvalidRow {
                        row: row_no,
                        reason: format!("unknown key kind '{}'", other),
                    });
                }
            }
        }

        Ok(table)
    }

    /// Load a CSV table from disk.
    ///
    /// # Errors
    ///
    /// See [`SectorTable::from_csv_reader`].
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, SectorTableError> {
        Self::from_csv_reader(std::fs::File::open(path)?)
    }
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn normalize_sector(sector: &str) -> String {
    sector.trim().to_lowercase()
}

/// Maps a snapshot to its [`CompanyType`].
#[derive(Debug, Clone, Default)]
pub struct SectorClassifier {
    table: SectorTable,
}

impl SectorClassifier {
    /// Create a classifier over the given table.
    pub const fn new(table: SectorTable) -> Self {
        Self { table }
    }

    /// The table driving classification.
    pub const fn table(&self) -> &SectorTable {
        &self.table
    }

    /// Classify a snapshot. Never fails: unmapped companies are
    /// non-financial.
    pub fn classify(&self, snapshot: &FundamentalsSnapshot) -> CompanyType {
        self.table
            .ticker(&snapshot.ticker)
            .or_else(|| {
                snapshot
                    .sector_hint
                    .as_deref()
                    .and_then(|hint| self.table.sector(hint))
            })
            .unwrap_or_default()
    }
}
