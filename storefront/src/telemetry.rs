//! Tracing subscriber setup for the command-line tool.

use clap::ValueEnum;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "storefront=info";

/// Output format for log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber, writing to stderr so stdout carries only
/// command outcomes.
pub fn init_tracing(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
