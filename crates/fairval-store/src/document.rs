//! The persisted store document.
//!
//! Deserialization enforces the shape (all three sources, a valid priority
//! permutation, no unknown source names); [`StoreDocument::validate`] then
//! checks every stored value. Together they decide whether a file on disk is
//! usable or corrupt.

use crate::FORMAT_VERSION;
use crate::error::{Result, StoreError};
use crate::source::{FairValueSource, PriorityOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticker to fair value for each source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceMaps {
    /// Values computed by the valuation engine
    pub dcf: BTreeMap<String, f64>,
    /// Hand-entered overrides
    pub manual: BTreeMap<String, f64>,
    /// Analyst targets
    pub analyst: BTreeMap<String, f64>,
}

impl SourceMaps {
    /// Values for one source.
    pub const fn get(&self, source: FairValueSource) -> &BTreeMap<String, f64> {
        match source {
            FairValueSource::Dcf => &self.dcf,
            FairValueSource::Manual => &self.manual,
            FairValueSource::Analyst => &self.analyst,
        }
    }

    /// Mutable values for one source.
    pub const fn get_mut(&mut self, source: FairValueSource) -> &mut BTreeMap<String, f64> {
        match source {
            FairValueSource::Dcf => &mut self.dcf,
            FairValueSource::Manual => &mut self.manual,
            FairValueSource::Analyst => &mut self.analyst,
        }
    }
}

/// Which source changed the document most recently, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LastUpdated {
    /// Time of the change
    pub time: DateTime<Utc>,
    /// Source that was changed
    pub source: FairValueSource,
}

/// The value that wins for a ticker under the current priority order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveValue {
    /// Fair value per share
    pub value: f64,
    /// Source it came from
    pub source: FairValueSource,
}

/// The whole store as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Per-source values
    pub sources: SourceMaps,
    /// Priority order, highest first
    pub priority: PriorityOrder,
    /// Most recent change, if any
    #[serde(deserialize_with = "Option::deserialize")]
    pub last_updated: Option<LastUpdated>,
    /// Time each source last changed
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_updated: BTreeMap<FairValueSource, DateTime<Utc>>,
}

const fn default_version() -> u32 {
    FORMAT_VERSION
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            sources: SourceMaps::default(),
            priority: PriorityOrder::default(),
            last_updated: None,
            source_updated: BTreeMap::new(),
        }
    }
}

impl StoreDocument {
    /// Check every stored value and ticker.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.version > FORMAT_VERSION {
            return Err(format!(
                "unsupported version {} (newest known is {})",
                self.version, FORMAT_VERSION
            ));
        }
        for source in FairValueSource::ALL {
            for (ticker, value) in self.sources.get(source) {
                if ticker.trim().is_empty() {
                    return Err(format!("{} has an empty ticker", source));
                }
                if !is_valid_value(*value) {
                    return Err(format!(
                        "{} value for {} is not positive ({})",
                        source, ticker, value
                    ));
                }
            }
        }
        Ok(())
    }

    /// Value from one source. The ticker is trimmed the same way writes
    /// trim it.
    pub fn get(&self, source: FairValueSource, ticker: &str) -> Option<f64> {
        self.sources.get(source).get(ticker.trim()).copied()
    }

    /// First present value in priority order.
    pub fn resolve(&self, ticker: &str) -> Option<EffectiveValue> {
        self.priority.iter().find_map(|source| {
            self.get(source, ticker)
                .map(|value| EffectiveValue { value, source })
        })
    }

    /// Effective value for every ticker known to any source.
    pub fn combined(&self) -> BTreeMap<String, EffectiveValue> {
        let mut combined = BTreeMap::new();
        for source in self.priority.iter() {
            for (ticker, value) in self.sources.get(source) {
                combined
                    .entry(ticker.clone())
                    .or_insert(EffectiveValue {
                        value: *value,
                        source,
                    });
            }
        }
        combined
    }

    /// Number of distinct tickers across all sources.
    pub fn ticker_count(&self) -> usize {
        self.combined().len()
    }

    /// Record one value.
    ///
    /// # Errors
    ///
    /// Rejects non-positive values and blank tickers; the document is left
    /// unchanged.
    pub fn set(&mut self, source: FairValueSource, ticker: &str, value: f64) -> Result<()> {
        let ticker = check_entry(source, ticker, value)?;
        self.sources.get_mut(source).insert(ticker, value);
        self.touch(source, Utc::now());
        Ok(())
    }

    /// Merge many values into one source; all are validated before any is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry; the document is left unchanged.
    pub fn merge_source(
        &mut self,
        source: FairValueSource,
        values: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let checked = check_all(source, values)?;
        if checked.is_empty() {
            return Ok(());
        }
        self.sources.get_mut(source).extend(checked);
        self.touch(source, Utc::now());
        Ok(())
    }

    /// Replace one source's values entirely.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry; the document is left unchanged.
    pub fn replace_source(
        &mut self,
        source: FairValueSource,
        values: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let checked = check_all(source, values)?;
        *self.sources.get_mut(source) = checked;
        self.touch(source, Utc::now());
        Ok(())
    }

    /// Remove one value, returning it if it was present.
    pub fn remove(&mut self, source: FairValueSource, ticker: &str) -> Option<f64> {
        let removed = self.sources.get_mut(source).remove(ticker.trim());
        if removed.is_some() {
            self.touch(source, Utc::now());
        }
        removed
    }

    fn touch(&mut self, source: FairValueSource, time: DateTime<Utc>) {
        self.last_updated = Some(LastUpdated { time, source });
        self.source_updated.insert(source, time);
    }
}

pub(crate) fn is_valid_value(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_entry(source: FairValueSource, ticker: &str, value: f64) -> Result<String> {
    let trimmed = ticker.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidTicker(ticker.to_string()));
    }
    if !is_valid_value(value) {
        return Err(StoreError::InvalidValue {
            source_name: source,
            ticker: trimmed.to_string(),
            value,
        });
    }
    Ok(trimmed.to_string())
}

fn check_all(
    source: FairValueSource,
    values: &BTreeMap<String, f64>,
) -> Result<BTreeMap<String, f64>> {
    values
        .iter()
        .map(|(ticker, value)| check_entry(source, ticker, *value).map(|t| (t, *value)))
        .collect()
}
