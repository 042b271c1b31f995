//! Fair value sources and their priority order.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An independent channel supplying candidate fair values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairValueSource {
    /// Computed by the valuation engine
    Dcf,
    /// Entered by hand
    Manual,
    /// External analyst target
    Analyst,
}

impl FairValueSource {
    /// All sources, in declaration order.
    pub const ALL: [Self; 3] = [Self::Dcf, Self::Manual, Self::Analyst];

    /// Name used in the persisted document and on the command line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dcf => "dcf",
            Self::Manual => "manual",
            Self::Analyst => "analyst",
        }
    }
}

impl fmt::Display for FairValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FairValueSource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|src| src.name() == name)
            .ok_or_else(|| StoreError::UnknownSource(s.to_string()))
    }
}

/// A permutation of the three sources; earlier sources win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FairValueSource>", into = "Vec<FairValueSource>")]
pub struct PriorityOrder([FairValueSource; 3]);

impl PriorityOrder {
    /// Validate an order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PriorityInvalid`] unless `order` names each
    /// source exactly once.
    pub fn new(order: &[FairValueSource]) -> Result<Self, StoreError> {
        let array: [FairValueSource; 3] = order.try_into().map_err(|_| {
            StoreError::PriorityInvalid(format!("expected 3 sources, got {}", order.len()))
        })?;
        for source in FairValueSource::ALL {
            if !array.contains(&source) {
                return Err(StoreError::PriorityInvalid(format!(
                    "{} is missing from [{}]",
                    source,
                    join(&array)
                )));
            }
        }
        Ok(Self(array))
    }

    /// Parse an order from source names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PriorityInvalid`] on an unknown name or when the
    /// names are not a permutation of the three sources.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, StoreError> {
        let sources = names
            .iter()
            .map(|name| {
                name.as_ref().parse::<FairValueSource>().map_err(|_| {
                    StoreError::PriorityInvalid(format!("unknown source '{}'", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&sources)
    }

    /// Sources from highest to lowest priority.
    pub const fn sources(&self) -> &[FairValueSource; 3] {
        &self.0
    }

    /// Iterate from highest to lowest priority.
    pub fn iter(&self) -> impl Iterator<Item = FairValueSource> + '_ {
        self.0.iter().copied()
    }

    /// Zero-based rank of a source; lower wins.
    pub fn rank(&self, source: FairValueSource) -> usize {
        self.0.iter().position(|s| *s == source).unwrap_or(self.0.len())
    }
}

impl Default for PriorityOrder {
    fn default() -> Self {
        Self([
            FairValueSource::Manual,
            FairValueSource::Dcf,
            FairValueSource::Analyst,
        ])
    }
}

impl TryFrom<Vec<FairValueSource>> for PriorityOrder {
    type Error = StoreError;

    fn try_from(order: Vec<FairValueSource>) -> Result<Self, Self::Error> {
        Self::new(&order)
    }
}

impl From<PriorityOrder> for Vec<FairValueSource> {
    fn from(order: PriorityOrder) -> Self {
        order.0.to_vec()
    }
}

impl fmt::Display for PriorityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", join(&self.0))
    }
}

fn join(sources: &[FairValueSource]) -> String {
    sources
        .iter()
        .map(FairValueSource::name)
        .collect::<Vec<_>>()
        .join(", ")
}
