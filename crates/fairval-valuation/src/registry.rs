//! Method Registry
//!
//! Static description of every valuation method and the fallback chain each
//! company type walks through.

use crate::classifier::CompanyType;
use crate::result::ValuationMethod;
use std::collections::HashMap;

const NON_FINANCIAL_CHAIN: &[ValuationMethod] = &[ValuationMethod::Dcf, ValuationMethod::Multiple];

const FINANCIAL_CHAIN: &[ValuationMethod] = &[
    ValuationMethod::Earnings,
    ValuationMethod::BookValue,
    ValuationMethod::Multiple,
];

/// Ordered methods attempted for a company type, first preferred.
///
/// Discounted cash flow is never attempted for banks or insurers: their free
/// cash flow is dominated by balance sheet flows and is not meaningful.
pub const fn method_chain(company_type: CompanyType) -> &'static [ValuationMethod] {
    match company_type {
        CompanyType::NonFinancial => NON_FINANCIAL_CHAIN,
        CompanyType::Bank | CompanyType::Insurance => FINANCIAL_CHAIN,
    }
}

/// Method metadata
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method
    pub method: ValuationMethod,
    /// Brief description of how the value is derived
    pub description: &'static str,
    /// Snapshot fields the method reads
    pub required_fields: &'static [&'static str],
}

/// Get all available method info
pub fn available_methods() -> Vec<MethodInfo> {
    vec![
        MethodInfo {
            method: ValuationMethod::Dcf,
            description: "Five-year free cash flow projection with a perpetuity terminal value, discounted at the CAPM rate",
            required_fields: &["free_cash_flow", "shares_outstanding"],
        },
        MethodInfo {
            method: ValuationMethod::Earnings,
            description: "Net income per share times the sector median (or fallback) P/E",
            required_fields: &["net_income", "shares_outstanding"],
        },
        MethodInfo {
            method: ValuationMethod::BookValue,
            description: "Book value per share times a price-to-book multiple",
            required_fields: &["book_value_per_share"],
        },
        MethodInfo {
            method: ValuationMethod::Multiple,
            description: "Trailing EPS times the sector median P/E",
            required_fields: &["trailing_eps", "sector_median_pe"],
        },
    ]
}

/// Get method info by identifier
pub fn get_method_info(id: &str) -> Option<MethodInfo> {
    available_methods()
        .into_iter()
        .find(|m| m.method.id() == id)
}

/// Company types whose chain contains the method
pub fn company_types_using(method: ValuationMethod) -> Vec<CompanyType> {
    CompanyType::all()
        .into_iter()
        .filter(|t| method_chain(*t).contains(&method))
        .collect()
}

/// Count how many company types use each method
pub fn usage_counts() -> HashMap<ValuationMethod, usize> {
    let mut counts = HashMap::new();
    for company_type in CompanyType::all() {
        for method in method_chain(company_type) {
            *counts.entry(*method).or_insert(0) += 1;
        }
    }
    counts
}
