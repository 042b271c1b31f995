//! Valuation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Valuation method that produced (or failed to produce) a fair value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    /// Discounted free cash flow
    Dcf,
    /// Normalized earnings times sector P/E
    Earnings,
    /// Book value per share times a price-to-book multiple
    BookValue,
    /// Trailing EPS times sector median P/E
    Multiple,
}

impl ValuationMethod {
    /// Returns all methods.
    pub fn all() -> Vec<Self> {
        vec![Self::Dcf, Self::Earnings, Self::BookValue, Self::Multiple]
    }

    /// Machine-readable identifier.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Dcf => "dcf",
            Self::Earnings => "earnings",
            Self::BookValue => "book_value",
            Self::Multiple => "multiple",
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Dcf => "DCF",
            Self::Earnings => "Earnings",
            Self::BookValue => "BookValue",
            Self::Multiple => "Multiple",
        }
    }

    /// Parse a method from its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|m| m.id() == id)
    }
}

impl fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One failed method attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Method that was attempted
    pub method: ValuationMethod,
    /// Why it did not produce a value
    pub reason: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(method: ValuationMethod, reason: impl Into<String>) -> Self {
        Self {
            method,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.reason)
    }
}

/// Fair value produced for one snapshot.
///
/// `fair_value_per_share` is strictly positive; the resolver never builds a
/// result otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Ticker identifier
    pub ticker: String,
    /// Estimated fair value per share
    pub fair_value_per_share: f64,
    /// Method that produced the value
    pub method_used: ValuationMethod,
    /// Methods tried before the winning one, with their failure reasons
    pub diagnostics: Vec<Diagnostic>,
}

impl ValuationResult {
    /// Whether the result came from a fallback rather than the first method
    /// of the chain.
    pub fn used_fallback(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
