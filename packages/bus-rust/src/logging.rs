//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the filter passed to [`init_tracing`].
pub const LOG_ENV_VAR: &str = "COMMANDMENT_LOG";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Build the filter: `COMMANDMENT_LOG` when set and valid, otherwise `default_filter`.
///
/// # Errors
///
/// Returns an error if `default_filter` is not a valid filter directive.
pub fn env_filter(default_filter: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_env(LOG_ENV_VAR).or_else(|_| EnvFilter::try_new(default_filter))?)
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(default_filter)?);
    match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
    }
    Ok(())
}
