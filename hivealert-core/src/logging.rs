use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{CoreError, Result};

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = build_filter(level)?;

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CoreError::Logging(err.to_string()))?;

    Ok(())
}

fn build_filter(level: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let default_level = level.unwrap_or("info");
    EnvFilter::try_new(default_level)
        .map_err(|err| CoreError::Logging(format!("invalid log filter '{default_level}': {err}")))
}
