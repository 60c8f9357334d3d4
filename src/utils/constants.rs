/// Default locations
pub const DEFAULT_STATIONS_FILE: &str = "./data/stations.txt";
pub const DEFAULT_TARGET_DIR: &str = "data";
pub const CONFIG_FILE_STEM: &str = "metar-store";
pub const ENV_PREFIX: &str = "METAR_STORE";

/// Station registry fixed-width layout. The width counts the trailing
/// line terminator, matching the published NOAA station table.
pub const STATION_LINE_WIDTH: usize = 84;
pub const STATION_COMMENT_PREFIX: char = '!';
pub const STATE_CODE_COLUMNS: (usize, usize) = (0, 2);
pub const NAME_COLUMNS: (usize, usize) = (3, 19);
pub const CODE4_COLUMNS: (usize, usize) = (20, 24);
pub const LATITUDE_COLUMNS: (usize, usize) = (39, 46);
pub const LONGITUDE_COLUMNS: (usize, usize) = (47, 54);
pub const ELEVATION_COLUMNS: (usize, usize) = (55, 59);

/// Partition naming
pub const PARTITION_KEY_FORMAT: &str = "%Y%m%d";
pub const PARTITION_EXTENSION: &str = "csv";

/// Magnus-form saturation vapour pressure coefficients
pub const MAGNUS_BASE_PA: f64 = 611.2;
pub const MAGNUS_A: f64 = 17.67;
pub const MAGNUS_B_C: f64 = 243.5;

/// Unit conversions
pub const MB_PER_INHG: f64 = 33.8639;
pub const KT_PER_MPS: f64 = 1.943_844;
pub const KT_PER_KMH: f64 = 0.539_957;
