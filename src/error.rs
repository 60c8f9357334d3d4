use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to replace partition file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Station file {} not found", path.display())]
    StationFileNotFound { path: PathBuf },

    #[error("Station {code} not found in registry")]
    StationNotFound { code: String },

    #[error("Invalid coordinate format: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid partition date key: {0}")]
    InvalidPartitionKey(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unable to decode METAR '{raw}': {reason}")]
    Decode { raw: String, reason: String },

    #[error("Report fetch failed: {0}")]
    FetchFailed(String),
}

impl IngestError {
    pub fn decode(raw: &str, reason: impl Into<String>) -> Self {
        IngestError::Decode {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}
