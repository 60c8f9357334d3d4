use crate::error::Result;
use crate::models::PartitionKey;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// One decoded report with derived humidity. Field order is the on-disk
/// CSV column order; `rawmetar` is the record's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ObservationRecord {
    /// Observation time, unix seconds
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: i64,

    pub name: String,

    #[validate(length(equal = 4))]
    pub code: String,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    pub ele: String,

    pub temperature_c: f64,
    pub dewpoint_c: f64,

    /// Fraction, not percent
    pub relativehumidity: f64,

    pub pressure_mb: f64,
    pub pressuresea_mb: Option<f64>,

    pub winddirection_deg: f64,
    pub windspeed_kt: f64,
    pub windgust_kt: Option<f64>,

    #[validate(length(min = 1))]
    pub rawmetar: String,
}

impl ObservationRecord {
    pub const FIELDS: [&'static str; 15] = [
        "timestamp",
        "name",
        "code",
        "lng",
        "lat",
        "ele",
        "temperature_c",
        "dewpoint_c",
        "relativehumidity",
        "pressure_mb",
        "pressuresea_mb",
        "winddirection_deg",
        "windspeed_kt",
        "windgust_kt",
        "rawmetar",
    ];

    pub fn partition_key(&self) -> Result<PartitionKey> {
        PartitionKey::from_timestamp(self.timestamp)
    }
}

/// Older partitions stored the timestamp as a float (`1697587200.0`).
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return Ok(seconds);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .map(|secs| secs.floor() as i64)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}
