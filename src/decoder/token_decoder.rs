use crate::decoder::{DecodedMetar, MetarDecoder};
use crate::error::{IngestError, Result};
use crate::utils::constants::{KT_PER_KMH, KT_PER_MPS, MB_PER_INHG};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

/// Group-by-group decoder for the report body plus the `SLP` and `T`
/// remarks. Unrecognised groups are ignored.
pub struct TokenDecoder {
    reference: Option<DateTime<Utc>>,
}

impl TokenDecoder {
    /// Resolve report days against the current time.
    pub fn new() -> Self {
        Self { reference: None }
    }

    /// Resolve report days against a fixed time.
    pub fn with_reference(reference: DateTime<Utc>) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    fn reference(&self) -> DateTime<Utc> {
        self.reference.unwrap_or_else(Utc::now)
    }
}

impl Default for TokenDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetarDecoder for TokenDecoder {
    fn decode(&self, raw: &str) -> Result<DecodedMetar> {
        let mut tokens = raw.split_whitespace().peekable();

        while matches!(
            tokens.peek(),
            Some(&"METAR") | Some(&"SPECI") | Some(&"COR") | Some(&"AMD") | Some(&"AUTO")
        ) {
            tokens.next();
        }

        let station_id = tokens
            .next()
            .filter(|t| is_station_id(t))
            .ok_or_else(|| IngestError::decode(raw, "missing station identifier"))?;

        let mut decoded = DecodedMetar {
            station_id: station_id.to_string(),
            ..DecodedMetar::default()
        };

        let mut in_remarks = false;
        for token in tokens {
            if token == "RMK" {
                in_remarks = true;
                continue;
            }

            if in_remarks {
                if let Some(slp) = parse_sea_level_pressure(token) {
                    decoded.sea_level_pressure_mb = Some(slp);
                } else if let Some((temp, dewpt)) = parse_precise_temperature(token) {
                    decoded.temperature_c = Some(temp);
                    decoded.dewpoint_c = Some(dewpt);
                }
                continue;
            }

            if decoded.time.is_none() && is_time_group(token) {
                decoded.time = resolve_time(token, self.reference());
                continue;
            }
            if decoded.wind_speed_kt.is_none() {
                if let Some((dir, speed, gust)) = parse_wind(token) {
                    decoded.wind_direction_deg = dir;
                    decoded.wind_speed_kt = Some(speed);
                    decoded.wind_gust_kt = gust;
                    continue;
                }
            }
            if decoded.temperature_c.is_none() {
                if let Some((temp, dewpt)) = parse_temperature(token) {
                    decoded.temperature_c = Some(temp);
                    decoded.dewpoint_c = dewpt;
                    continue;
                }
            }
            if decoded.pressure_mb.is_none() {
                decoded.pressure_mb = parse_pressure(token);
            }
        }

        Ok(decoded)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_station_id(token: &str) -> bool {
    token.len() == 4
        && token.bytes().all(|b| b.is_ascii_alphanumeric())
        && token.as_bytes()[0].is_ascii_alphabetic()
}

fn is_time_group(token: &str) -> bool {
    token.len() == 7 && token.ends_with('Z') && all_digits(&token[..6])
}

/// `DDHHMMZ`, with month and year taken from `reference`; a day later in
/// the month than the reference belongs to the previous month.
fn resolve_time(token: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let day: u32 = token[0..2].parse().ok()?;
    let hour: u32 = token[2..4].parse().ok()?;
    let minute: u32 = token[4..6].parse().ok()?;

    let mut month_start = NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1)?;
    if day > reference.day() {
        month_start = month_start.checked_sub_months(Months::new(1))?;
    }

    NaiveDate::from_ymd_opt(month_start.year(), month_start.month(), day)?
        .and_hms_opt(hour, minute, 0)
        .map(|naive| naive.and_utc())
}

/// `dddff(Ggg)KT`, `MPS` or `KMH`. Direction is `None` for `VRB`.
fn parse_wind(token: &str) -> Option<(Option<f64>, f64, Option<f64>)> {
    let (body, factor) = if let Some(b) = token.strip_suffix("KT") {
        (b, 1.0)
    } else if let Some(b) = token.strip_suffix("MPS") {
        (b, KT_PER_MPS)
    } else if let Some(b) = token.strip_suffix("KMH") {
        (b, KT_PER_KMH)
    } else {
        return None;
    };

    if body.len() < 5 || !body.is_char_boundary(3) {
        return None;
    }
    let (dir_str, rest) = body.split_at(3);
    let direction = match dir_str {
        "VRB" => None,
        d if all_digits(d) => Some(d.parse::<f64>().ok()?),
        _ => return None,
    };

    let (speed_str, gust_str) = match rest.split_once('G') {
        Some((speed, gust)) => (speed, Some(gust)),
        None => (rest, None),
    };
    if !(2..=3).contains(&speed_str.len()) || !all_digits(speed_str) {
        return None;
    }
    let speed = speed_str.parse::<f64>().ok()? * factor;

    let gust = match gust_str {
        Some(g) if (2..=3).contains(&g.len()) && all_digits(g) => {
            Some(g.parse::<f64>().ok()? * factor)
        }
        Some(_) => return None,
        None => None,
    };

    Some((direction, speed, gust))
}

fn parse_signed_degrees(s: &str) -> Option<f64> {
    let (negative, digits) = match s.strip_prefix('M') {
        Some(d) => (true, d),
        None => (false, s),
    };
    if digits.len() != 2 || !all_digits(digits) {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}

/// `TT/DD`, `M` marking negatives; the dewpoint may be absent (`TT/`).
fn parse_temperature(token: &str) -> Option<(f64, Option<f64>)> {
    let (temp_str, dewpt_str) = token.split_once('/')?;
    let temp = parse_signed_degrees(temp_str)?;
    let dewpt = match dewpt_str {
        "" | "//" => None,
        d => Some(parse_signed_degrees(d)?),
    };
    Some((temp, dewpt))
}

/// `Annnn` (hundredths of inHg) or `Qnnnn` (hPa), returned in mb.
fn parse_pressure(token: &str) -> Option<f64> {
    if token.len() != 5 || !token.is_ascii() {
        return None;
    }
    let (unit, digits) = token.split_at(1);
    if !all_digits(digits) {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    match unit {
        "A" => Some(value / 100.0 * MB_PER_INHG),
        "Q" => Some(value),
        _ => None,
    }
}

/// `SLPnnn`: tenths of mb with the leading 9 or 10 dropped.
fn parse_sea_level_pressure(token: &str) -> Option<f64> {
    let digits = token.strip_prefix("SLP")?;
    if digits.len() != 3 || !all_digits(digits) {
        return None;
    }
    let tenths = digits.parse::<f64>().ok()?;
    if tenths < 500.0 {
        Some(1000.0 + tenths / 10.0)
    } else {
        Some(900.0 + tenths / 10.0)
    }
}

/// `Tsnnnsnnn`: temperature and dewpoint in tenths, sign digit 1 = negative.
fn parse_precise_temperature(token: &str) -> Option<(f64, f64)> {
    let digits = token.strip_prefix('T')?;
    if digits.len() != 8 || !all_digits(digits) {
        return None;
    }
    let tenths = |group: &str| -> Option<f64> {
        let value = group[1..].parse::<f64>().ok()? / 10.0;
        match &group[..1] {
            "0" => Some(value),
            "1" => Some(-value),
            _ => None,
        }
    };
    Some((tenths(&digits[..4])?, tenths(&digits[4..])?))
}
