use crate::error::{IngestError, Result};
use crate::models::Station;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Supplies raw report text blocks for a set of stations. A failed fetch
/// must not produce partial output.
pub trait ReportSource {
    fn fetch(&self, stations: &[&Station], hours: u32) -> Result<Vec<String>>;
}

/// Reports already captured to a text file, one per line. The file is
/// taken as covering the requested window, so `hours` is not applied.
pub struct FileReportSource {
    path: PathBuf,
}

impl FileReportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSource for FileReportSource {
    fn fetch(&self, stations: &[&Station], _hours: u32) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            IngestError::FetchFailed(format!("{}: {}", self.path.display(), e))
        })?;

        let wanted: HashSet<&str> = stations.iter().map(|s| s.code4.as_str()).collect();

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| station_token(line).map_or(false, |code| wanted.contains(code)))
            .map(str::to_string)
            .collect())
    }
}

/// First token that looks like an ICAO identifier, past any report-type prefix.
fn station_token(report: &str) -> Option<&str> {
    report
        .split_whitespace()
        .find(|token| !matches!(*token, "METAR" | "SPECI" | "COR" | "AMD" | "AUTO"))
        .filter(|token| token.len() == 4)
}
