//! Company fundamentals consumed by the valuation engine.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};

/// Per-company fundamentals for one scan cycle.
///
/// Monetary amounts are in the reporting currency; per-share figures are in
/// the quote currency. Every field except `ticker` and `shares_outstanding`
/// may be absent, and absence is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    /// Stable ticker identifier (e.g. `ASML.AS`)
    pub ticker: String,
    /// Company short name
    #[serde(default)]
    pub name: Option<String>,
    /// Provider sector or industry code, used only as a lookup key
    #[serde(default)]
    pub sector_hint: Option<String>,
    /// Most recent annual free cash flow
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    /// Revenue (TTM)
    #[serde(default)]
    pub revenue: Option<f64>,
    /// Net income (TTM)
    #[serde(default)]
    pub net_income: Option<f64>,
    /// Book value per share
    #[serde(default)]
    pub book_value_per_share: Option<f64>,
    /// Shares outstanding
    pub shares_outstanding: f64,
    /// Equity beta
    #[serde(default)]
    pub beta: Option<f64>,
    /// Total debt minus cash
    #[serde(default)]
    pub net_debt: Option<f64>,
    /// Trailing twelve month earnings per share
    #[serde(default)]
    pub trailing_eps: Option<f64>,
    /// Median P/E of the company's sector
    #[serde(default)]
    pub sector_median_pe: Option<f64>,
    /// Near-term growth estimate as a fraction (0.08 = 8%)
    #[serde(default)]
    pub growth_rate: Option<f64>,
}

impl FundamentalsSnapshot {
    /// Start building a snapshot.
    pub fn builder(ticker: impl Into<String>, shares_outstanding: f64) -> SnapshotBuilder {
        SnapshotBuilder::new(ticker, shares_outstanding)
    }

    /// Check the structural constraints every snapshot must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidTicker`] for an empty ticker and
    /// [`DataError::InvalidSnapshot`] for a non-positive share count or a
    /// non-finite numeric field.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(DataError::InvalidTicker("Empty ticker".to_string()));
        }

        if !self.shares_outstanding.is_finite() || self.shares_outstanding <= 0.0 {
            return Err(self.invalid(format!(
                "shares_outstanding must be positive, got {}",
                self.shares_outstanding
            )));
        }

        let fields = [
            ("free_cash_flow", self.free_cash_flow),
            ("revenue", self.revenue),
            ("net_income", self.net_income),
            ("book_value_per_share", self.book_value_per_share),
            ("beta", self.beta),
            ("net_debt", self.net_debt),
            ("trailing_eps", self.trailing_eps),
            ("sector_median_pe", self.sector_median_pe),
            ("growth_rate", self.growth_rate),
        ];
        for (field, value) in fields {
            if let Some(v) = value
                && !v.is_finite()
            {
                return Err(self.invalid(format!("{} is not finite", field)));
            }
        }

        Ok(())
    }

    /// Earnings per share derived from net income, when net income is known.
    pub fn earnings_per_share(&self) -> Option<f64> {
        self.net_income.map(|ni| ni / self.shares_outstanding)
    }

    /// Return on equity from net income over total book value.
    pub fn return_on_equity(&self) -> Option<f64> {
        let income = self.net_income?;
        let book = self.book_value_per_share.filter(|b| *b > 0.0)?;
        Some(income / (book * self.shares_outstanding))
    }

    fn invalid(&self, reason: String) -> DataError {
        DataError::InvalidSnapshot {
            ticker: self.ticker.clone(),
            reason,
        }
    }
}

/// Builder for [`FundamentalsSnapshot`] that validates on `build`.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: FundamentalsSnapshot,
}

impl SnapshotBuilder {
    /// Create a builder with only the required fields set.
    pub fn new(ticker: impl Into<String>, shares_outstanding: f64) -> Self {
        Self {
            snapshot: FundamentalsSnapshot {
                ticker: ticker.into(),
                name: None,
                sector_hint: None,
                free_cash_flow: None,
                revenue: None,
                net_income: None,
                book_value_per_share: None,
                shares_outstanding,
                beta: None,
                net_debt: None,
                trailing_eps: None,
                sector_median_pe: None,
                growth_rate: None,
            },
        }
    }

    /// Set the company name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.snapshot.name = Some(name.into());
        self
    }

    /// Set the sector hint.
    pub fn sector_hint(mut self, hint: impl Into<String>) -> Self {
        self.snapshot.sector_hint = Some(hint.into());
        self
    }

    /// Set free cash flow.
    pub const fn free_cash_flow(mut self, value: f64) -> Self {
        self.snapshot.free_cash_flow = Some(value);
        self
    }

    /// Set revenue.
    pub const fn revenue(mut self, value: f64) -> Self {
        self.snapshot.revenue = Some(value);
        self
    }

    /// Set net income.
    pub const fn net_income(mut self, value: f64) -> Self {
        self.snapshot.net_income = Some(value);
        self
    }

    /// Set book value per share.
    pub const fn book_value_per_share(mut self, value: f64) -> Self {
        self.snapshot.book_value_per_share = Some(value);
        self
    }

    /// Set beta.
    pub const fn beta(mut self, value: f64) -> Self {
        self.snapshot.beta = Some(value);
        self
    }

    /// Set net debt.
    pub const fn net_debt(mut self, value: f64) -> Self {
        self.snapshot.net_debt = Some(value);
        self
    }

    /// Set trailing EPS.
    pub const fn trailing_eps(mut self, value: f64) -> Self {
        self.snapshot.trailing_eps = Some(value);
        self
    }

    /// Set the sector median P/E.
    pub const fn sector_median_pe(mut self, value: f64) -> Self {
        self.snapshot.sector_median_pe = Some(value);
        self
    }

    /// Set the near-term growth estimate.
    pub const fn growth_rate(mut self, value: f64) -> Self {
        self.snapshot.growth_rate = Some(value);
        self
    }

    /// Validate and produce the snapshot.
    ///
    /// # Errors
    ///
    /// See [`FundamentalsSnapshot::validate`].
    pub fn build(self) -> Result<FundamentalsSnapshot> {
        self.snapshot.validate()?;
        Ok(self.snapshot)
    }
}
