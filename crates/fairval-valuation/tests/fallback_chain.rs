//! Integration tests for method selection and fallback.

use approx::assert_relative_eq;
use fairval_data::FundamentalsSnapshot;
use fairval_valuation::{
    CompanyType, DcfConfig, DcfValuator, FairValueResolver, MethodError, SectorClassifier,
    SectorTable, ValuationConfig, ValuationMethod, Valuator, value_batch,
};
use rstest::rstest;

fn resolver_with(config: ValuationConfig) -> FairValueResolver {
    let table = SectorTable::gics_financials()
        .with_ticker("INGA.AS", CompanyType::Bank)
        .with_ticker("NN.AS", CompanyType::Insurance);
    FairValueResolver::new(SectorClassifier::new(table), config)
}

#[test]
fn test_terminal_growth_at_wacc_falls_through_to_multiple() {
    // rf 0.03 + 1.0 * 0.05 = 0.08 and terminal growth 0.08
    let config = ValuationConfig {
        dcf: DcfConfig {
            terminal_growth: 0.08,
            ..Default::default()
        },
        ..Default::default()
    };
    let snapshot = FundamentalsSnapshot::builder("ASML.AS", 100.0)
        .free_cash_flow(1_000.0)
        .trailing_eps(25.0)
        .sector_median_pe(30.0)
        .build()
        .unwrap();

    let dcf_err = DcfValuator::new(config.dcf.clone()).value(&snapshot).unwrap_err();
    assert!(matches!(dcf_err, MethodError::NegativeDenominator { .. }));

    let result = resolver_with(config).resolve(&snapshot).unwrap();
    assert_eq!(result.method_used, ValuationMethod::Multiple);
    assert_relative_eq!(result.fair_value_per_share, 750.0);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].method, ValuationMethod::Dcf);
    assert!(result.diagnostics[0].reason.contains("terminal growth"));
}

#[test]
fn test_dcf_preferred_for_non_financials() {
    let snapshot = FundamentalsSnapshot::builder("REF", 10.0)
        .free_cash_flow(100.0)
        .growth_rate(0.10)
        .beta(1.2)
        .trailing_eps(1.0)
        .sector_median_pe(10.0)
        .build()
        .unwrap();
    let config = ValuationConfig {
        dcf: DcfConfig {
            terminal_growth: 0.02,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = resolver_with(config).resolve(&snapshot).unwrap();
    assert_eq!(result.method_used, ValuationMethod::Dcf);
    assert!(!result.used_fallback());
    assert_relative_eq!(result.fair_value_per_share, 179.9162528415201, epsilon = 1e-9);
}

#[test]
fn test_bank_ignores_positive_free_cash_flow() {
    let snapshot = FundamentalsSnapshot::builder("INGA.AS", 3_000.0)
        .free_cash_flow(50_000.0)
        .net_income(6_000.0)
        .sector_median_pe(9.0)
        .build()
        .unwrap();
    let result = resolver_with(ValuationConfig::default()).resolve(&snapshot).unwrap();
    assert_eq!(result.method_used, ValuationMethod::Earnings);
    assert_relative_eq!(result.fair_value_per_share, 18.0);
}

#[test]
fn test_insurer_with_no_usable_data_is_not_computable() {
    let snapshot = FundamentalsSnapshot::builder("NN.AS", 300.0)
        .free_cash_flow(2_000.0)
        .net_income(-10.0)
        .book_value_per_share(0.0)
        .trailing_eps(-0.5)
        .build()
        .unwrap();
    let err = resolver_with(ValuationConfig::default())
        .resolve(&snapshot)
        .unwrap_err();
    assert_eq!(err.ticker, "NN.AS");
    assert_eq!(err.attempts.len(), 3);
    assert!(err.to_string().contains("no valuation method succeeded for NN.AS"));
}

#[test]
fn test_negative_equity_moves_to_next_method() {
    let snapshot = FundamentalsSnapshot::builder("LEVERED", 10.0)
        .free_cash_flow(10.0)
        .net_debt(1_000_000.0)
        .trailing_eps(2.0)
        .sector_median_pe(12.0)
        .build()
        .unwrap();
    let result = resolver_with(ValuationConfig::default()).resolve(&snapshot).unwrap();
    assert_eq!(result.method_used, ValuationMethod::Multiple);
    assert!(matches!(result.diagnostics[0].method, ValuationMethod::Dcf));
}

#[rstest]
#[case(0.01, 0.0, -0.5)]
#[case(1.0, 0.6, 0.0)]
#[case(250.0, 1.0, 0.12)]
#[case(1.0e6, 1.8, 0.5)]
#[case(3.5e9, 2.4, 0.9)]
fn test_dcf_strictly_positive(#[case] fcf: f64, #[case] beta: f64, #[case] growth: f64) {
    let snapshot = FundamentalsSnapshot::builder("P", 1_000.0)
        .free_cash_flow(fcf)
        .beta(beta)
        .growth_rate(growth)
        .build()
        .unwrap();
    let value = DcfValuator::default().value(&snapshot).unwrap();
    assert!(value > 0.0);
}

#[test]
fn test_batch_matches_sequential() {
    let resolver = resolver_with(ValuationConfig::default());
    let snapshots: Vec<_> = (1..=20)
        .map(|i| {
            FundamentalsSnapshot::builder(format!("S{i:02}"), 100.0)
                .free_cash_flow(f64::from(i) * 10.0)
                .build()
                .unwrap()
        })
        .collect();

    let outcome = value_batch(&resolver, &snapshots);
    assert!(outcome.failed.is_empty());
    for (batch, snapshot) in outcome.valued.iter().zip(&snapshots) {
        let single = resolver.resolve(snapshot).unwrap();
        assert_eq!(batch, &single);
    }
}
