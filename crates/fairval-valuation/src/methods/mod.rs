//! Valuation methods.
//!
//! Each method turns one snapshot into a fair value per share or explains why
//! it cannot. Methods are pure: no I/O and no shared state, so the same
//! instance can be used from many threads at once.

pub mod book_value;
pub mod dcf;
pub mod earnings;
pub mod multiple;

pub use book_value::BookValueValuator;
pub use dcf::{DcfBreakdown, DcfValuator, capm_discount_rate, growth_schedule};
pub use earnings::EarningsValuator;
pub use multiple::MultipleValuator;

use crate::error::MethodError;
use crate::result::ValuationMethod;
use fairval_data::FundamentalsSnapshot;

/// A single valuation method.
pub trait Valuator: Send + Sync + std::fmt::Debug {
    /// Which method this is.
    fn method(&self) -> ValuationMethod;

    /// Fair value per share for the snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`MethodError`] when the method's inputs are missing or
    /// unusable; the caller is expected to fall back to another method.
    fn value(&self, snapshot: &FundamentalsSnapshot) -> Result<f64, MethodError>;
}

/// Require an optional input to be present and strictly positive.
pub(crate) fn require_positive(value: Option<f64>, field: &str) -> Result<f64, MethodError> {
    match value {
        Some(v) if v > 0.0 => Ok(v),
        Some(v) => Err(MethodError::incomplete(format!(
            "{} is not positive ({})",
            field, v
        ))),
        None => Err(MethodError::incomplete(format!("{} is missing", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive(Some(2.0), "x").unwrap(), 2.0);

        let err = require_positive(Some(0.0), "net_income").unwrap_err();
        assert_eq!(err.to_string(), "data incomplete: net_income is not positive (0)");

        let err = require_positive(None, "trailing_eps").unwrap_err();
        assert_eq!(err.to_string(), "data incomplete: trailing_eps is missing");
    }
}
