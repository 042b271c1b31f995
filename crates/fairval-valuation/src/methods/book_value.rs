//! Price-to-book valuation.

use super::{Valuator, require_positive};
use crate::config::BookValueConfig;
use crate::error::MethodError;
use crate::result::ValuationMethod;
use fairval_data::FundamentalsSnapshot;

/// Book value per share times a price-to-book multiple chosen by
/// [`PriceToBookPolicy`](crate::config::PriceToBookPolicy).
#[derive(Debug, Clone, Default)]
pub struct BookValueValuator {
    config: BookValueConfig,
}

impl BookValueValuator {
    /// Create a valuator with the given policy.
    pub const fn new(config: BookValueConfig) -> Self {
        Self { config }
    }

    /// Multiple applied to a snapshot.
    pub fn multiple(&self, snapshot: &FundamentalsSnapshot) -> f64 {
        self.config.policy.multiple(snapshot.return_on_equity())
    }
}

impl Valuator for BookValueValuator {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::BookValue
    }

    fn value(&self, snapshot: &FundamentalsSnapshot) -> Result<f64, MethodError> {
        let bvps = require_positive(snapshot.book_value_per_share, "book_value_per_share")?;
        let multiple = require_positive(Some(self.multiple(snapshot)), "price_to_book")?;
        Ok(bvps * multiple)
    }
}
