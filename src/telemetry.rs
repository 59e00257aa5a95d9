//! Tracing subscriber setup.

use crate::settings::{LogFormat, Settings};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL` when set.
/// Returns an error if a subscriber is already installed.
pub fn init(settings: &Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
}
