//! Earnings-based valuation for financial companies.

use super::{Valuator, require_positive};
use crate::config::EarningsConfig;
use crate::error::MethodError;
use crate::result::ValuationMethod;
use fairval_data::FundamentalsSnapshot;

/// Values net income per share at the sector median P/E, or at the
/// configured fallback P/E when the snapshot carries no usable median.
#[derive(Debug, Clone, Default)]
pub struct EarningsValuator {
    config: EarningsConfig,
}

impl EarningsValuator {
    /// Create a valuator with the given assumptions.
    pub const fn new(config: EarningsConfig) -> Self {
        Self { config }
    }

    /// P/E applied to a snapshot.
    pub fn price_earnings(&self, snapshot: &FundamentalsSnapshot) -> f64 {
        snapshot
            .sector_median_pe
            .filter(|pe| *pe > 0.0)
            .unwrap_or(self.config.fallback_pe)
    }
}

impl Valuator for EarningsValuator {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::Earnings
    }

    fn value(&self, snapshot: &FundamentalsSnapshot) -> Result<f64, MethodError> {
        let net_income = require_positive(snapshot.net_income, "net_income")?;
        let shares = require_positive(Some(snapshot.shares_outstanding), "shares_outstanding")?;
        let pe = require_positive(Some(self.price_earnings(snapshot)), "price_earnings")?;
        Ok(net_income / shares * pe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uses_sector_median() {
        let snapshot = FundamentalsSnapshot::builder("INGA.AS", 100.0)
            .net_income(500.0)
            .sector_median_pe(8.0)
            .build()
            .unwrap();
        let value = EarningsValuator::default().value(&snapshot).unwrap();
        assert_relative_eq!(value, 40.0);
    }

    #[test]
    fn test_falls_back_to_configured_pe() {
        let snapshot = FundamentalsSnapshot::builder("INGA.AS", 100.0)
            .net_income(500.0)
            .build()
            .unwrap();
        let value = EarningsValuator::default().value(&snapshot).unwrap();
        assert_relative_eq!(value, 50.0);
    }

    #[test]
    fn test_loss_making_company() {
        let snapshot = FundamentalsSnapshot::builder("X", 100.0)
            .net_income(-20.0)
            .build()
            .unwrap();
        assert!(matches!(
            EarningsValuator::default().value(&snapshot),
            Err(MethodError::DataIncomplete(_))
        ));
    }
}
