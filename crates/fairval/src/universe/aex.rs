//! AEX index universe.

use crate::universe::gics::{
    BANKS_INDUSTRY_GROUP, FINANCIAL_SERVICES_INDUSTRY_GROUP, GicsSector,
    INSURANCE_INDUSTRY_GROUP, company_type_for_industry_group,
};
use fairval_valuation::SectorTable;
use std::collections::HashMap;

/// AEX constituent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    /// Exchange ticker
    pub symbol: String,
    /// Company name
    pub name: String,
    /// GICS sector
    pub sector: GicsSector,
    /// GICS industry group, recorded for the financials
    pub industry_group: Option<u16>,
}

impl Constituent {
    /// Create a constituent without an industry group.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, sector: GicsSector) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector,
            industry_group: None,
        }
    }

    /// Attach the GICS industry group.
    pub const fn with_industry_group(mut self, group: u16) -> Self {
        self.industry_group = Some(group);
        self
    }

    /// Sector hint handed to the classifier: the industry group code when
    /// known, else the sector code.
    pub fn sector_hint(&self) -> String {
        self.industry_group
            .map_or_else(|| self.sector.code().to_string(), |g| g.to_string())
    }
}

/// AEX universe.
#[derive(Debug, Clone)]
pub struct AexUniverse {
    constituents: Vec<Constituent>,
    by_symbol: HashMap<String, usize>,
}

impl AexUniverse {
    /// Universe with the built-in constituent list.
    pub fn new() -> Self {
        Self::from_constituents(Self::default_constituents())
    }

    /// Universe over an explicit constituent list.
    pub fn from_constituents(constituents: Vec<Constituent>) -> Self {
        let by_symbol = constituents
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.symbol.clone(), idx))
            .collect();
        Self {
            constituents,
            by_symbol,
        }
    }

    /// All constituents in index order.
    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }

    /// All symbols in index order.
    pub fn symbols(&self) -> Vec<String> {
        self.constituents.iter().map(|c| c.symbol.clone()).collect()
    }

    /// Constituent for a symbol.
    pub fn get(&self, symbol: &str) -> Option<&Constituent> {
        self.by_symbol.get(symbol).map(|&idx| &self.constituents[idx])
    }

    /// GICS sector for a symbol.
    pub fn sector(&self, symbol: &str) -> Option<GicsSector> {
        self.get(symbol).map(|c| c.sector)
    }

    /// Symbols in one sector.
    pub fn symbols_in_sector(&self, sector: GicsSector) -> Vec<String> {
        self.constituents
            .iter()
            .filter(|c| c.sector == sector)
            .map(|c| c.symbol.clone())
            .collect()
    }

    /// Constituent count per sector.
    pub fn sector_counts(&self) -> HashMap<GicsSector, usize> {
        let mut counts = HashMap::new();
        for constituent in &self.constituents {
            *counts.entry(constituent.sector).or_insert(0) += 1;
        }
        counts
    }

    /// Classification table for this universe: the GICS financial groups plus
    /// a ticker entry for every bank and insurer in the index.
    pub fn sector_table(&self) -> SectorTable {
        let mut table = SectorTable::gics_financials();
        for constituent in &self.constituents {
            if let Some(ty) = constituent
                .industry_group
                .and_then(company_type_for_industry_group)
            {
                table.insert_ticker(&constituent.symbol, ty);
            }
        }
        table
    }

    fn default_constituents() -> Vec<Constituent> {
        use GicsSector::*;

        vec![
            Constituent::new("ADYEN.AS", "Adyen", Financials)
                .with_industry_group(FINANCIAL_SERVICES_INDUSTRY_GROUP),
            Constituent::new("ASML.AS", "ASML Holding", InformationTechnology),
            Constituent::new("AD.AS", "Ahold Delhaize", ConsumerStaples),
            Constituent::new("AKZA.AS", "Akzo Nobel", Materials),
            Constituent::new("ABN.AS", "ABN AMRO Bank", Financials)
                .with_industry_group(BANKS_INDUSTRY_GROUP),
            Constituent::new("DSM.AS", "DSM", Materials),
            Constituent::new("HEIA.AS", "Heineken", ConsumerStaples),
            Constituent::new("IMCD.AS", "IMCD", Industrials),
            Constituent::new("INGA.AS", "ING Groep", Financials)
                .with_industry_group(BANKS_INDUSTRY_GROUP),
            Constituent::new("KPN.AS", "KPN", CommunicationServices),
            Constituent::new("NN.AS", "NN Group", Financials)
                .with_industry_group(INSURANCE_INDUSTRY_GROUP),
            Constituent::new("PHIA.AS", "Philips", HealthCare),
            Constituent::new("RAND.AS", "Randstad", Industrials),
            Constituent::new("REN.AS", "RELX", Industrials),
            Constituent::new("WKL.AS", "Wolters Kluwer", Industrials),
            Constituent::new("URW.AS", "Unibail-Rodamco-Westfield", RealEstate),
            Constituent::new("UNA.AS", "Unilever", ConsumerStaples),
            Constituent::new("MT.AS", "ArcelorMittal", Materials),
            Constituent::new("RDSA.AS", "Royal Dutch Shell", Energy),
            Constituent::new("PRX.AS", "Prosus", ConsumerDiscretionary),
            Constituent::new("AGN.AS", "Aegon", Financials)
                .with_industry_group(INSURANCE_INDUSTRY_GROUP),
            Constituent::new("ASRNL.AS", "ASR Nederland", Financials)
                .with_industry_group(INSURANCE_INDUSTRY_GROUP),
        ]
    }
}

impl Default for AexUniverse {
    fn default() -> Self {
        Self::new()
    }
}
