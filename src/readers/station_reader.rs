use crate::error::{IngestError, Result};
use crate::models::{Station, StationRegistry};
use crate::utils::constants::{
    CODE4_COLUMNS, ELEVATION_COLUMNS, LATITUDE_COLUMNS, LONGITUDE_COLUMNS, NAME_COLUMNS,
    STATE_CODE_COLUMNS, STATION_COMMENT_PREFIX, STATION_LINE_WIDTH,
};
use crate::utils::coordinates::{parse_latitude, parse_longitude};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, Span};

/// What a single registry line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Station,
    Blank,
    Comment,
    /// Header, state/country banner or anything else off the fixed width
    WrongWidth(usize),
}

/// Classify one line (terminator already stripped). The registry width
/// counts the terminator, so a station row carries one character less.
pub fn classify(line: &str) -> LineClass {
    if line.trim().is_empty() {
        return LineClass::Blank;
    }
    if line.starts_with(STATION_COMMENT_PREFIX) {
        return LineClass::Comment;
    }
    let width = line.chars().count() + 1;
    if width != STATION_LINE_WIDTH {
        return LineClass::WrongWidth(width);
    }
    LineClass::Station
}

pub struct StationReader {
    span: Span,
}

impl StationReader {
    pub fn new() -> Self {
        Self::with_span(Span::none())
    }

    pub fn with_span(span: Span) -> Self {
        Self { span }
    }

    /// Read the fixed-width station table into a registry keyed by code.
    pub fn load(&self, path: &Path) -> Result<StationRegistry> {
        let _enter = self.span.enter();

        if !path.exists() {
            return Err(IngestError::StationFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let reader = BufReader::new(File::open(path)?);
        let mut registry = StationRegistry::new();
        let mut skipped = 0usize;

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.strip_suffix('\r').unwrap_or(&line);

            match classify(line) {
                LineClass::Station => {
                    let station = self.parse_station_line(line).map_err(|e| {
                        IngestError::InvalidCoordinate(format!("line {}: {}", index + 1, e))
                    })?;
                    registry.insert(station);
                }
                other => {
                    debug!(line = index + 1, class = ?other, "Skipping registry line");
                    skipped += 1;
                }
            }
        }

        info!(
            path = %path.display(),
            stations = registry.len(),
            skipped,
            "Loaded station registry"
        );

        Ok(registry)
    }

    /// Slice a classified station row into its columns.
    pub fn parse_station_line(&self, line: &str) -> Result<Station> {
        let latitude = parse_latitude(column(line, LATITUDE_COLUMNS))?;
        let longitude = parse_longitude(column(line, LONGITUDE_COLUMNS))?;

        Ok(Station::new(
            column(line, STATE_CODE_COLUMNS).to_string(),
            column(line, NAME_COLUMNS).trim().to_string(),
            column(line, CODE4_COLUMNS).to_string(),
            longitude,
            latitude,
            column(line, ELEVATION_COLUMNS).trim().to_string(),
            line.to_string(),
        ))
    }
}

/// Column offsets count characters, so map them to byte offsets first.
fn column(line: &str, (start, end): (usize, usize)) -> &str {
    let byte_at = |index: usize| {
        line.char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(line.len()))
            .nth(index)
    };
    match (byte_at(start), byte_at(end)) {
        (Some(from), Some(to)) => &line[from..to],
        _ => "",
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
