//! Process-wide logging initialization
//!
//! Called once at startup by the embedding binary; nothing in this crate
//! configures logging implicitly. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for interactive runs
    #[default]
    Pretty,
    /// One JSON object per event, for log collectors
    Json,
}

/// Initialize the global tracing subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already set; call exactly once.
pub fn init(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}
