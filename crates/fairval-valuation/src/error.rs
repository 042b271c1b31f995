//! Valuation errors.
//!
//! [`MethodError`] is recoverable: the resolver records it and moves on to
//! the next method. [`NotComputableError`] is the terminal outcome once the
//! whole chain has failed.

use crate::result::Diagnostic;
use thiserror::Error;

/// Failure of a single valuation method.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MethodError {
    /// Required input missing or non-positive
    #[error("data incomplete: {0}")]
    DataIncomplete(String),

    /// Terminal growth is not below the discount rate
    #[error(
        "terminal growth {terminal_growth:.4} is not below discount rate {discount_rate:.4}"
    )]
    NegativeDenominator {
        /// Perpetuity growth rate
        terminal_growth: f64,
        /// Discount rate the perpetuity is divided by
        discount_rate: f64,
    },
}

impl MethodError {
    /// Shorthand for [`MethodError::DataIncomplete`].
    pub fn incomplete(reason: impl Into<String>) -> Self {
        Self::DataIncomplete(reason.into())
    }
}

/// Every method in the chain failed for this ticker.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no valuation method succeeded for {ticker} ({})", summarize(.attempts))]
pub struct NotComputableError {
    /// Ticker that could not be valued
    pub ticker: String,
    /// One entry per attempted method, in chain order
    pub attempts: Vec<Diagnostic>,
}

fn summarize(attempts: &[Diagnostic]) -> String {
    if attempts.is_empty() {
        return "no methods attempted".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ValuationMethod;

    #[test]
    fn test_not_computable_message_lists_attempts() {
        let err = NotComputableError {
            ticker: "NN.AS".to_string(),
            attempts: vec![
                Diagnostic::new(ValuationMethod::Earnings, "no net income"),
                Diagnostic::new(ValuationMethod::Multiple, "no trailing EPS"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("NN.AS"));
        assert!(msg.contains("Earnings: no net income"));
        assert!(msg.contains("Multiple: no trailing EPS"));
    }

    #[test]
    fn test_negative_denominator_message() {
        let err = MethodError::NegativeDenominator {
            terminal_growth: 0.1,
            discount_rate: 0.08,
        };
        assert_eq!(
            err.to_string(),
            "terminal growth 0.1000 is not below discount rate 0.0800"
        );
    }
}
