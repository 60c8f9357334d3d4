use crate::error::Result;
use crate::models::{ObservationRecord, PartitionKey};
use crate::readers::PartitionReader;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Health and coverage of one partition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    pub key: PartitionKey,
    pub exists: bool,
    pub rows: usize,
    pub stations: BTreeSet<String>,
    pub first_observation: Option<DateTime<Utc>>,
    pub last_observation: Option<DateTime<Utc>>,
    /// Rows whose timestamp falls on another day
    pub misplaced_rows: usize,
    /// Rows repeating an earlier `rawmetar`
    pub duplicate_rows: usize,
}

impl PartitionSummary {
    pub fn inspect(target_dir: &Path, key: PartitionKey) -> Result<Self> {
        let path = key.path_under(target_dir);
        let exists = path.exists();
        let records = PartitionReader::read(&path)?;
        Ok(Self::from_records(key, exists, &records))
    }

    pub fn from_records(key: PartitionKey, exists: bool, records: &[ObservationRecord]) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let duplicate_rows = records
            .iter()
            .filter(|r| !seen.insert(r.rawmetar.as_str()))
            .count();

        let first = records.iter().map(|r| r.timestamp).min();
        let last = records.iter().map(|r| r.timestamp).max();

        Self {
            key,
            exists,
            rows: records.len(),
            stations: records.iter().map(|r| r.code.clone()).collect(),
            first_observation: first.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            last_observation: last.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            misplaced_rows: records.iter().filter(|r| !key.contains(r.timestamp)).count(),
            duplicate_rows,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.misplaced_rows == 0 && self.duplicate_rows == 0
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("=== Partition {} ===\n", self.key));
        if !self.exists {
            summary.push_str("No partition file\n");
            return summary;
        }
        summary.push_str(&format!("Rows: {}\n", self.rows));
        summary.push_str(&format!("Stations: {}\n", self.stations.len()));
        if let (Some(first), Some(last)) = (self.first_observation, self.last_observation) {
            summary.push_str(&format!(
                "Observations: {} to {}\n",
                first.format("%Y-%m-%d %H:%MZ"),
                last.format("%Y-%m-%d %H:%MZ")
            ));
        }
        summary.push_str(&format!("Rows outside day: {}\n", self.misplaced_rows));
        summary.push_str(&format!("Duplicate rows: {}\n", self.duplicate_rows));

        summary
    }
}
