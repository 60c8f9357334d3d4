use crate::error::{IngestError, Result};

/// Which axis a coordinate belongs to; decides the negative hemisphere letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn negative_hemisphere(self) -> char {
        match self {
            Axis::Latitude => 'S',
            Axis::Longitude => 'W',
        }
    }

    fn positive_hemisphere(self) -> char {
        match self {
            Axis::Latitude => 'N',
            Axis::Longitude => 'E',
        }
    }
}

/// Convert degree/minute notation with a hemisphere suffix to decimal degrees
///
/// # Examples
/// ```
/// use metar_store::utils::coordinates::{parse_degree_minutes, Axis};
///
/// let lat = parse_degree_minutes("40 26N", Axis::Latitude).unwrap();
/// assert!((lat - 40.433333).abs() < 0.000001);
/// ```
pub fn parse_degree_minutes(coord: &str, axis: Axis) -> Result<f64> {
    let trimmed = coord.trim();
    let mut parts = trimmed.split_whitespace();

    let (degree_str, minute_str) = match (parts.next(), parts.next(), parts.next()) {
        (Some(d), Some(m), None) => (d, m),
        _ => {
            return Err(IngestError::InvalidCoordinate(format!(
                "Invalid degree/minute format: '{}'. Expected format: 'DD MMH'",
                coord
            )))
        }
    };

    let hemisphere = minute_str.chars().last().unwrap_or(' ');
    if hemisphere != axis.negative_hemisphere() && hemisphere != axis.positive_hemisphere() {
        return Err(IngestError::InvalidCoordinate(format!(
            "Invalid hemisphere '{}' in '{}'",
            hemisphere, coord
        )));
    }

    let degrees = degree_str.parse::<u32>().map_err(|_| {
        IngestError::InvalidCoordinate(format!("Invalid degrees value: '{}'", degree_str))
    })?;

    let minute_digits = &minute_str[..minute_str.len() - hemisphere.len_utf8()];
    let minutes = minute_digits.parse::<u32>().map_err(|_| {
        IngestError::InvalidCoordinate(format!("Invalid minutes value: '{}'", minute_digits))
    })?;

    let magnitude = degrees as f64 + minutes as f64 / 60.0;

    if hemisphere == axis.negative_hemisphere() {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

pub fn parse_latitude(coord: &str) -> Result<f64> {
    parse_degree_minutes(coord, Axis::Latitude)
}

pub fn parse_longitude(coord: &str) -> Result<f64> {
    parse_degree_minutes(coord, Axis::Longitude)
}
