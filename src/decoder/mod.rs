pub mod token_decoder;

pub use token_decoder::TokenDecoder;

use crate::error::Result;
use chrono::{DateTime, Utc};

/// Fields of a METAR report the store cares about, already in the units
/// it records (°C, mb, degrees true, knots).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedMetar {
    pub station_id: String,
    pub time: Option<DateTime<Utc>>,
    pub temperature_c: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub pressure_mb: Option<f64>,
    pub sea_level_pressure_mb: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_speed_kt: Option<f64>,
    pub wind_gust_kt: Option<f64>,
}

impl DecodedMetar {
    /// Names of the required fields that are absent.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.time.is_none() {
            missing.push("time");
        }
        if self.temperature_c.is_none() {
            missing.push("temperature");
        }
        if self.dewpoint_c.is_none() {
            missing.push("dewpoint");
        }
        if self.pressure_mb.is_none() {
            missing.push("pressure");
        }
        if self.wind_direction_deg.is_none() {
            missing.push("wind_direction");
        }
        if self.wind_speed_kt.is_none() {
            missing.push("wind_speed");
        }
        missing
    }
}

/// Turns raw report text into a [`DecodedMetar`]; fails only when the text
/// cannot be read as a report at all.
pub trait MetarDecoder {
    fn decode(&self, raw: &str) -> Result<DecodedMetar>;
}
