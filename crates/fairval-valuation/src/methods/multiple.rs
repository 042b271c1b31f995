//! Trailing earnings multiple.

use super::{Valuator, require_positive};
use crate::error::MethodError;
use crate::result::ValuationMethod;
use fairval_data::FundamentalsSnapshot;

/// Trailing EPS times the sector median P/E. The last resort for every
/// company type; it has no configurable fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipleValuator;

impl MultipleValuator {
    /// Create a valuator.
    pub const fn new() -> Self {
        Self
    }
}

impl Valuator for MultipleValuator {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::Multiple
    }

    fn value(&self, snapshot: &FundamentalsSnapshot) -> Result<f64, MethodError> {
        let eps = require_positive(snapshot.trailing_eps, "trailing_eps")?;
        let pe = require_positive(snapshot.sector_median_pe, "sector_median_pe")?;
        Ok(eps * pe)
    }
}
