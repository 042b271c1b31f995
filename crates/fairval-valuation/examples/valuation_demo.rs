//! Walks two companies through their method chains.
//!
//! Run with: cargo run --example valuation_demo -p fairval-valuation

use fairval_data::FundamentalsSnapshot;
use fairval_valuation::{
    CompanyType, FairValueResolver, ResolverState, SectorClassifier, SectorTable, ValuationConfig,
    available_methods, method_chain,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Valuation Methods");
    println!("=================\n");
    for info in available_methods() {
        println!("  {:10} {}", info.method.label(), info.description);
    }

    println!("\nChains:");
    for company_type in CompanyType::all() {
        let labels: Vec<_> = method_chain(company_type).iter().map(|m| m.label()).collect();
        println!("  {:14} {}", company_type.to_string(), labels.join(" -> "));
    }

    let table = SectorTable::gics_financials().with_ticker("ABN.AS", CompanyType::Bank);
    let resolver = FairValueResolver::new(SectorClassifier::new(table), ValuationConfig::default());

    let snapshots = [
        FundamentalsSnapshot::builder("ASML.AS", 393.0)
            .free_cash_flow(9_000.0)
            .growth_rate(0.12)
            .beta(1.1)
            .net_debt(-5_000.0)
            .build()?,
        FundamentalsSnapshot::builder("ABN.AS", 832.0)
            .net_income(-100.0)
            .book_value_per_share(25.0)
            .build()?,
    ];

    for snapshot in &snapshots {
        println!("\n{} ({})", snapshot.ticker, resolver.classifier().classify(snapshot));
        let mut run = resolver.start(snapshot);
        loop {
            match run.step() {
                ResolverState::Attempting(method) => println!("  trying {}", method),
                ResolverState::Succeeded(result) => {
                    println!(
                        "  fair value {:.2} via {}",
                        result.fair_value_per_share, result.method_used
                    );
                    break;
                }
                ResolverState::Exhausted(err) => {
                    println!("  {}", err);
                    break;
                }
                ResolverState::NotStarted => {}
            }
        }
    }

    Ok(())
}
