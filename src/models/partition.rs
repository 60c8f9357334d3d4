use crate::error::{IngestError, Result};
use crate::utils::constants::{PARTITION_EXTENSION, PARTITION_KEY_FORMAT};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// A UTC calendar day addressing one partition file (`YYYYMMDD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(NaiveDate);

impl PartitionKey {
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime.date_naive())
    }

    pub fn from_timestamp(timestamp: i64) -> Result<Self> {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(Self::from_datetime)
            .ok_or_else(|| {
                IngestError::InvalidPartitionKey(format!(
                    "Timestamp {} is out of range",
                    timestamp
                ))
            })
    }

    pub fn parse(key: &str) -> Result<Self> {
        if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IngestError::InvalidPartitionKey(format!(
                "'{}' is not of the form YYYYMMDD",
                key
            )));
        }
        NaiveDate::parse_from_str(key, PARTITION_KEY_FORMAT)
            .map(Self)
            .map_err(|e| IngestError::InvalidPartitionKey(format!("'{}': {}", key, e)))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `<root>/<YYYY>/<MM>/<YYYYMMDD>.csv`
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(format!("{:04}", self.0.year()))
            .join(format!("{:02}", self.0.month()))
            .join(format!("{}.{}", self, PARTITION_EXTENSION))
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        PartitionKey::from_timestamp(timestamp).map_or(false, |k| k == *self)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PARTITION_KEY_FORMAT))
    }
}
