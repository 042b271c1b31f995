//! Discounted free cash flow valuation.
//!
//! Non-financial companies are valued by projecting free cash flow over a
//! fixed horizon, adding a perpetuity-growth terminal value, and discounting
//! everything at a CAPM rate:
//!
//! ```text
//! r      = risk_free + beta * equity_risk_premium
//! g_t    = g0 + (gT - g0) * (t - 1) / N          t = 1..=N
//! FCF_t  = FCF_{t-1} * (1 + g_t)
//! TV     = FCF_N * (1 + gT) / (r - gT)
//! EV     = sum(FCF_t / (1 + r)^t) + TV / (1 + r)^N
//! value  = (EV - net_debt) / shares
//! ```
//!
//! Year one grows at the clamped near-term rate and growth steps down
//! linearly so the first perpetuity year grows at `gT`.

use super::{Valuator, require_positive};
use crate::config::DcfConfig;
use crate::error::MethodError;
use crate::result::ValuationMethod;
use fairval_data::FundamentalsSnapshot;
use serde::{Deserialize, Serialize};

/// CAPM cost of equity.
pub fn capm_discount_rate(risk_free_rate: f64, beta: f64, equity_risk_premium: f64) -> f64 {
    risk_free_rate + beta * equity_risk_premium
}

/// Per-year growth rates tapering linearly from `near_term` toward
/// `terminal` over `years` years.
pub fn growth_schedule(near_term: f64, terminal: f64, years: u32) -> Vec<f64> {
    let n = f64::from(years);
    (0..years)
        .map(|i| near_term + (terminal - near_term) * f64::from(i) / n)
        .collect()
}

/// Intermediate figures of one DCF run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfBreakdown {
    /// CAPM discount rate
    pub discount_rate: f64,
    /// Near-term growth after clamping
    pub near_term_growth: f64,
    /// Growth applied in each projected year
    pub growth_schedule: Vec<f64>,
    /// Projected free cash flow per year
    pub projected_cash_flows: Vec<f64>,
    /// Present value of each projected year
    pub discounted_cash_flows: Vec<f64>,
    /// Terminal value at the end of the horizon
    pub terminal_value: f64,
    /// Present value of the terminal value
    pub discounted_terminal_value: f64,
    /// Sum of discounted cash flows and discounted terminal value
    pub enterprise_value: f64,
    /// Enterprise value less net debt
    pub equity_value: f64,
    /// Equity value per share
    pub fair_value_per_share: f64,
}

/// DCF valuator.
#[derive(Debug, Clone, Default)]
pub struct DcfValuator {
    config: DcfConfig,
}

impl DcfValuator {
    /// Create a valuator with the given assumptions.
    pub const fn new(config: DcfConfig) -> Self {
        Self { config }
    }

    /// Current assumptions.
    pub const fn config(&self) -> &DcfConfig {
        &self.config
    }

    /// Discount rate for a company with the given beta; absent beta uses the
    /// configured default.
    pub fn discount_rate(&self, beta: Option<f64>) -> f64 {
        capm_discount_rate(
            self.config.risk_free_rate,
            beta.unwrap_or(self.config.default_beta),
            self.config.equity_risk_premium,
        )
    }

    /// Near-term growth for a snapshot, defaulted and clamped.
    pub fn near_term_growth(&self, snapshot: &FundamentalsSnapshot) -> f64 {
        let clamp = self.config.growth_clamp.abs();
        snapshot
            .growth_rate
            .unwrap_or(self.config.default_growth_rate)
            .max(-clamp)
            .min(clamp)
    }

    /// Run the full projection and keep every intermediate figure.
    ///
    /// # Errors
    ///
    /// - [`MethodError::DataIncomplete`] if free cash flow is missing or not
    ///   positive, shares outstanding is not positive, the horizon is zero,
    ///   or the resulting value per share is not positive.
    /// - [`MethodError::NegativeDenominator`] if terminal growth is not
    ///   strictly below the discount rate.
    pub fn project(&self, snapshot: &FundamentalsSnapshot) -> Result<DcfBreakdown, MethodError> {
        let fcf = require_positive(snapshot.free_cash_flow, "free_cash_flow")?;
        let shares = require_positive(Some(snapshot.shares_outstanding), "shares_outstanding")?;
        if self.config.projection_years == 0 {
            return Err(MethodError::incomplete("projection horizon is zero years"));
        }

        let discount_rate = self.discount_rate(snapshot.beta);
        let terminal_growth = self.config.terminal_growth;
        if terminal_growth >= discount_rate {
            return Err(MethodError::NegativeDenominator {
                terminal_growth,
                discount_rate,
            });
        }

        let near_term_growth = self.near_term_growth(snapshot);
        let schedule = growth_schedule(
            near_term_growth,
            terminal_growth,
            self.config.projection_years,
        );

        let mut projected = Vec::with_capacity(schedule.len());
        let mut discounted = Vec::with_capacity(schedule.len());
        let mut cash_flow = fcf;
        for (idx, growth) in schedule.iter().enumerate() {
            let year = idx as i32 + 1;
            cash_flow *= 1.0 + growth;
            projected.push(cash_flow);
            discounted.push(cash_flow / (1.0 + discount_rate).powi(year));
        }

        let horizon = self.config.projection_years as i32;
        let terminal_value = cash_flow * (1.0 + terminal_growth) / (discount_rate - terminal_growth);
        let discounted_terminal_value = terminal_value / (1.0 + discount_rate).powi(horizon);

        let enterprise_value = discounted.iter().sum::<f64>() + discounted_terminal_value;
        let equity_value = enterprise_value - snapshot.net_debt.unwrap_or(0.0);
        let fair_value_per_share = equity_value / shares;

        if !fair_value_per_share.is_finite() || fair_value_per_share <= 0.0 {
            return Err(MethodError::incomplete(format!(
                "equity value {:.2} after net debt is not positive",
                equity_value
            )));
        }

        Ok(DcfBreakdown {
            discount_rate,
            near_term_growth,
            growth_schedule: schedule,
            projected_cash_flows: projected,
            discounted_cash_flows: discounted,
            terminal_value,
            discounted_terminal_value,
            enterprise_value,
            equity_value,
            fair_value_per_share,
        })
    }
}

impl Valuator for DcfValuator {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::Dcf
    }

    fn value(&self, snapshot: &FundamentalsSnapshot) -> Result<f64, MethodError> {
        self.project(snapshot).map(|b| b.fair_value_per_share)
    }
}
