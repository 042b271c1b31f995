//! Valuation constants.
//!
//! Every numeric assumption the methods rely on lives here so it can be
//! audited, overridden from a JSON file, and pinned in tests.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// ROE thresholds and the price-to-book multiple each one earns, highest
/// first.
pub const ROE_TIERS: [(f64, f64); 4] = [(0.20, 2.0), (0.15, 1.7), (0.10, 1.4), (0.05, 1.0)];

/// Multiple applied when ROE is at or below the lowest tier.
pub const ROE_FLOOR_MULTIPLE: f64 = 0.8;

/// Multiple applied when ROE cannot be computed.
pub const NEUTRAL_MULTIPLE: f64 = 1.0;

/// Discounted cash flow assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfConfig {
    /// Risk-free rate used in CAPM (default: 0.03)
    pub risk_free_rate: f64,
    /// Equity risk premium used in CAPM (default: 0.05)
    pub equity_risk_premium: f64,
    /// Beta assumed when the snapshot has none (default: 1.0)
    pub default_beta: f64,
    /// Near-term growth assumed when the snapshot has none (default: 0.03)
    pub default_growth_rate: f64,
    /// Perpetuity growth after the projection horizon (default: 0.025)
    pub terminal_growth: f64,
    /// Number of explicitly projected years (default: 5)
    pub projection_years: u32,
    /// Absolute bound on near-term growth (default: 0.50)
    pub growth_clamp: f64,
}

impl Default for DcfConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.03,
            equity_risk_premium: 0.05,
            default_beta: 1.0,
            default_growth_rate: 0.03,
            terminal_growth: 0.025,
            projection_years: 5,
            growth_clamp: 0.50,
        }
    }
}

/// Earnings method assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsConfig {
    /// P/E used when the snapshot carries no sector median (default: 10.0)
    pub fallback_pe: f64,
}

impl Default for EarningsConfig {
    fn default() -> Self {
        Self { fallback_pe: 10.0 }
    }
}

/// How the book value method picks its multiple.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceToBookPolicy {
    /// Same multiple for every company
    Fixed {
        /// Price-to-book multiple
        multiple: f64,
    },
    /// Multiple stepped by return on equity, see [`ROE_TIERS`]
    #[default]
    RoeTiered,
}

impl PriceToBookPolicy {
    /// Multiple for a company with the given return on equity.
    pub fn multiple(&self, roe: Option<f64>) -> f64 {
        match self {
            Self::Fixed { multiple } => *multiple,
            Self::RoeTiered => roe.map_or(NEUTRAL_MULTIPLE, |roe| {
                ROE_TIERS
                    .iter()
                    .find(|(threshold, _)| roe > *threshold)
                    .map_or(ROE_FLOOR_MULTIPLE, |(_, multiple)| *multiple)
            }),
        }
    }
}

/// Book value method assumptions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookValueConfig {
    /// Multiple selection policy
    pub policy: PriceToBookPolicy,
}

/// All valuation assumptions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// DCF assumptions
    pub dcf: DcfConfig,
    /// Earnings assumptions
    pub earnings: EarningsConfig,
    /// Book value assumptions
    pub book_value: BookValueConfig,
}

impl ValuationConfig {
    /// Load overrides from a JSON file; omitted fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Errors loading a [`ValuationConfig`] file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("Invalid valuation config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = ValuationConfig::default();
        assert_eq!(config.dcf.risk_free_rate, 0.03);
        assert_eq!(config.dcf.equity_risk_premium, 0.05);
        assert_eq!(config.dcf.projection_years, 5);
        assert_eq!(config.dcf.growth_clamp, 0.50);
        assert_eq!(config.earnings.fallback_pe, 10.0);
        assert_eq!(config.book_value.policy, PriceToBookPolicy::RoeTiered);
    }

    #[rstest]
    #[case(Some(0.25), 2.0)]
    #[case(Some(0.18), 1.7)]
    #[case(Some(0.12), 1.4)]
    #[case(Some(0.07), 1.0)]
    #[case(Some(0.05), 0.8)]
    #[case(Some(-0.10), 0.8)]
    #[case(None, 1.0)]
    fn test_roe_tiers(#[case] roe: Option<f64>, #[case] expected: f64) {
        assert_eq!(PriceToBookPolicy::RoeTiered.multiple(roe), expected);
    }

    #[test]
    fn test_fixed_policy_ignores_roe() {
        let policy = PriceToBookPolicy::Fixed { multiple: 1.2 };
        assert_eq!(policy.multiple(Some(0.30)), 1.2);
        assert_eq!(policy.multiple(None), 1.2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"dcf": {"risk_free_rate": 0.025}, "book_value": {"policy": {"kind": "fixed", "multiple": 1.1}}}"#;
        let config: ValuationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dcf.risk_free_rate, 0.025);
        assert_eq!(config.dcf.equity_risk_premium, 0.05);
        assert_eq!(
            config.book_value.policy,
            PriceToBookPolicy::Fixed { multiple: 1.1 }
        );
        assert_eq!(config.earnings.fallback_pe, 10.0);
    }
}
