//! GICS sectors and the financial industry groups the valuation chain cares
//! about.

use fairval_valuation::CompanyType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// GICS industry group for banks.
pub const BANKS_INDUSTRY_GROUP: u16 = 4010;

/// GICS industry group for diversified financials (payments, asset managers).
pub const FINANCIAL_SERVICES_INDUSTRY_GROUP: u16 = 4020;

/// GICS industry group for insurance.
pub const INSURANCE_INDUSTRY_GROUP: u16 = 4030;

/// GICS Level 1 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GicsSector {
    /// Energy
    Energy,
    /// Materials
    Materials,
    /// Industrials
    Industrials,
    /// Consumer Discretionary
    ConsumerDiscretionary,
    /// Consumer Staples
    ConsumerStaples,
    /// Health Care
    HealthCare,
    /// Financials
    Financials,
    /// Information Technology
    InformationTechnology,
    /// Communication Services
    CommunicationServices,
    /// Utilities
    Utilities,
    /// Real Estate
    RealEstate,
}

impl GicsSector {
    /// Returns all sectors in code order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Energy,
            Self::Materials,
            Self::Industrials,
            Self::ConsumerDiscretionary,
            Self::ConsumerStaples,
            Self::HealthCare,
            Self::Financials,
            Self::InformationTechnology,
            Self::CommunicationServices,
            Self::Utilities,
            Self::RealEstate,
        ]
    }

    /// Two-digit sector code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Energy => 10,
            Self::Materials => 15,
            Self::Industrials => 20,
            Self::ConsumerDiscretionary => 25,
            Self::ConsumerStaples => 30,
            Self::HealthCare => 35,
            Self::Financials => 40,
            Self::InformationTechnology => 45,
            Self::CommunicationServices => 50,
            Self::Utilities => 55,
            Self::RealEstate => 60,
        }
    }

    /// Full sector name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Materials => "Materials",
            Self::Industrials => "Industrials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::ConsumerStaples => "Consumer Staples",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::InformationTechnology => "Information Technology",
            Self::CommunicationServices => "Communication Services",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
        }
    }

    /// Parse a sector from its two-digit code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            10 => Some(Self::Energy),
            15 => Some(Self::Materials),
            20 => Some(Self::Industrials),
            25 => Some(Self::ConsumerDiscretionary),
            30 => Some(Self::ConsumerStaples),
            35 => Some(Self::HealthCare),
            40 => Some(Self::Financials),
            45 => Some(Self::InformationTechnology),
            50 => Some(Self::CommunicationServices),
            55 => Some(Self::Utilities),
            60 => Some(Self::RealEstate),
            _ => None,
        }
    }

    /// Sector an industry group belongs to (its first two digits).
    pub fn from_industry_group(group: u16) -> Option<Self> {
        u8::try_from(group / 100).ok().and_then(Self::from_code)
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Company type implied by a GICS industry group, if it is one of the
/// financial groups valued on earnings and book value.
pub const fn company_type_for_industry_group(group: u16) -> Option<CompanyType> {
    match group {
        BANKS_INDUSTRY_GROUP => Some(CompanyType::Bank),
        INSURANCE_INDUSTRY_GROUP => Some(CompanyType::Insurance),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sectors() {
        let sectors = GicsSector::all();
        assert_eq!(sectors.len(), 11);
        for sector in sectors {
            assert_eq!(GicsSector::from_code(sector.code()), Some(sector));
        }
    }

    #[test]
    fn test_from_code() {
        assert_eq!(GicsSector::from_code(45), Some(GicsSector::InformationTechnology));
        assert_eq!(GicsSector::from_code(99), None);
    }

    #[test]
    fn test_industry_group_sector() {
        assert_eq!(
            GicsSector::from_industry_group(BANKS_INDUSTRY_GROUP),
            Some(GicsSector::Financials)
        );
        assert_eq!(GicsSector::from_industry_group(4520), Some(GicsSector::InformationTechnology));
        assert_eq!(GicsSector::from_industry_group(9999), None);
    }

    #[test]
    fn test_financial_groups() {
        assert_eq!(company_type_for_industry_group(4010), Some(CompanyType::Bank));
        assert_eq!(company_type_for_industry_group(4030), Some(CompanyType::Insurance));
        assert_eq!(company_type_for_industry_group(FINANCIAL_SERVICES_INDUSTRY_GROUP), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", GicsSector::ConsumerStaples), "Consumer Staples");
    }
}
