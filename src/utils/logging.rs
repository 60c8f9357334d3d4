//! Subscriber setup for the binary.
//!
//! Library components never install a subscriber. Each one is handed a
//! [`tracing::Span`] when constructed and emits its events inside it, so the
//! caller decides where (and whether) those events are recorded.

use crate::error::{IngestError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global fmt subscriber. `RUST_LOG` directives take precedence
/// over `level`.
pub fn init_logging(level: &str, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| {
            IngestError::Config(config::ConfigError::Message(format!(
                "Invalid log level '{}': {}",
                default_level, e
            )))
        })?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| {
            IngestError::Config(config::ConfigError::Message(format!(
                "Failed to install log subscriber: {}",
                e
            )))
        })
}
