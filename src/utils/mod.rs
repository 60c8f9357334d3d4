pub mod constants;
pub mod coordinates;
pub mod humidity;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use coordinates::{parse_latitude, parse_longitude};
pub use humidity::{relative_humidity, saturation_vapor_pressure};
pub use progress::ProgressReporter;
