use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(equal = 2))]
    pub state_code: String,

    pub name: String,

    #[validate(length(equal = 4))]
    pub code4: String,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    /// Kept verbatim (trimmed) from the registry column
    pub elevation: String,

    pub raw_line: String,
}

impl Station {
    pub fn new(
        state_code: String,
        name: String,
        code4: String,
        longitude: f64,
        latitude: f64,
        elevation: String,
        raw_line: String,
    ) -> Self {
        Self {
            state_code,
            name,
            code4,
            longitude,
            latitude,
            elevation,
            raw_line,
        }
    }
}

/// Stations keyed by their 4-letter code. Later rows with a code already
/// present replace the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: HashMap<String, Station>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, station: Station) -> Option<Station> {
        self.stations.insert(station.code4.clone(), station)
    }

    pub fn get(&self, code4: &str) -> Option<&Station> {
        self.stations.get(code4)
    }

    /// Like [`get`](Self::get) but an unknown code is an error.
    pub fn lookup(&self, code4: &str) -> Result<&Station> {
        self.get(code4).ok_or_else(|| IngestError::StationNotFound {
            code: code4.to_string(),
        })
    }

    pub fn contains(&self, code4: &str) -> bool {
        self.stations.contains_key(code4)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Stations sorted by code, optionally restricted to one state code.
    pub fn sorted(&self, state_code: Option<&str>) -> Vec<&Station> {
        let mut stations: Vec<&Station> = self
            .stations
            .values()
            .filter(|s| state_code.map_or(true, |sc| s.state_code.eq_ignore_ascii_case(sc)))
            .collect();
        stations.sort_by(|a, b| a.code4.cmp(&b.code4));
        stations
    }
}

impl FromIterator<Station> for StationRegistry {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        let mut registry = StationRegistry::new();
        for station in iter {
            registry.insert(station);
        }
        registry
    }
}
