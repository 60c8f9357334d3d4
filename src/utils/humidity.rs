use crate::utils::constants::{MAGNUS_A, MAGNUS_B_C, MAGNUS_BASE_PA};

/// Saturation vapour pressure in pascals (Magnus form)
pub fn saturation_vapor_pressure(temperature_c: f64) -> f64 {
    MAGNUS_BASE_PA * (MAGNUS_A * temperature_c / (temperature_c + MAGNUS_B_C)).exp()
}

/// Relative humidity as a fraction, from air temperature and dewpoint.
///
/// Not clamped: a dewpoint reported slightly above the air temperature
/// yields a value above 1.
pub fn relative_humidity(temperature_c: f64, dewpoint_c: f64) -> f64 {
    saturation_vapor_pressure(dewpoint_c) / saturation_vapor_pressure(temperature_c)
}
