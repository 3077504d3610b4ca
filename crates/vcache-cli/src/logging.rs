//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. Filtering follows `RUST_LOG`
//! and falls back to `info`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, optionally with ANSI colors.
    Pretty { ansi: bool },
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    pub fn new(json: bool, no_color: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Pretty { ansi: !no_color }
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once, before the first log event.
pub fn init(format: LogFormat) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty { ansi } => builder.with_ansi(ansi).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_selection() {
        assert_eq!(LogFormat::new(true, false), LogFormat::Json);
        assert_eq!(LogFormat::new(true, true), LogFormat::Json);
        assert_eq!(LogFormat::new(false, true), LogFormat::Pretty { ansi: false });
        assert_eq!(LogFormat::new(false, false), LogFormat::Pretty { ansi: true });
    }
}
