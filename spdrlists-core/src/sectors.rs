//! Sector suffix table. Maps sector names to the short codes used to name
//! simulated per-sector watchlists (`mdy` + `e` -> `mdye`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::DEFAULT_SECTOR_SUFFIXES;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorSuffixes {
    codes: BTreeMap<String, String>,
}

impl SectorSuffixes {
    pub fn new(codes: BTreeMap<String, String>) -> Self {
        Self { codes }
    }

    /// Table seeded with the generic Select Sector SPDR designations.
    pub fn seeded() -> Self {
        Self::new(
            DEFAULT_SECTOR_SUFFIXES
                .iter()
                .map(|(sector, code)| (sector.to_string(), code.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, sector: &str) -> Option<&str> {
        self.codes.get(sector).map(|c| c.as_str())
    }

    /// Record `sector -> code`, overwriting any previous code.
    /// Returns the code it replaced, if any.
    pub fn record(&mut self, sector: &str, code: &str) -> Option<String> {
        self.codes.insert(sector.to_string(), code.to_string())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }
}
