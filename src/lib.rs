pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod store;
pub mod utils;
pub mod writers;

pub use error::{IngestError, Result};
