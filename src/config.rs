use crate::error::Result;
use crate::utils::constants::{
    CONFIG_FILE_STEM, DEFAULT_STATIONS_FILE, DEFAULT_TARGET_DIR, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Run settings, layered: defaults, then `metar-store.toml` (or an explicit
/// file), then `METAR_STORE_*` environment variables.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    pub target_dir: PathBuf,

    pub stations_file: PathBuf,

    #[validate(range(max = 48))]
    pub hours: u32,

    #[validate(length(min = 1))]
    pub log_level: String,
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("target_dir", DEFAULT_TARGET_DIR)?
            .set_default("stations_file", DEFAULT_STATIONS_FILE)?
            .set_default("hours", 0)?
            .set_default("log_level", "info")?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(CONFIG_FILE_STEM).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn with_overrides(
        mut self,
        target_dir: Option<PathBuf>,
        stations_file: Option<PathBuf>,
        hours: Option<u32>,
    ) -> Result<Self> {
        if let Some(dir) = target_dir {
            self.target_dir = dir;
        }
        if let Some(file) = stations_file {
            self.stations_file = file;
        }
        if let Some(hours) = hours {
            self.hours = hours;
        }
        self.validate()?;
        Ok(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            stations_file: PathBuf::from(DEFAULT_STATIONS_FILE),
            hours: 0,
            log_level: "info".to_string(),
        }
    }
}
