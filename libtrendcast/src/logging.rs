//! Logging setup shared by the Trendcast binaries
//!
//! Everything goes to stderr so stdout stays scriptable. Format and level
//! come from `TRENDCAST_LOG_FORMAT` (text or json) and
//! `TRENDCAST_LOG_LEVEL`; `RUST_LOG` wins when set, and the binaries'
//! `--verbose` flag forces a debug floor over all of them.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines for the terminal and for piping.
    #[default]
    Text,
    /// One JSON object per line, for log collectors.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format '{}', expected text or json", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Install the global subscriber for a binary.
///
/// # Panics
///
/// Panics if a global subscriber is already set; call once, first thing
/// in `main`.
pub fn init(verbose: bool) {
    let filter = level_filter(verbose);

    match format_from_env() {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }
}

fn format_from_env() -> LogFormat {
    std::env::var("TRENDCAST_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn level_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = std::env::var("TRENDCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    EnvFilter::new(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("pretty".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_display_round_trips() {
        for format in [LogFormat::Text, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    #[serial]
    fn test_format_defaults_to_text() {
        std::env::remove_var("TRENDCAST_LOG_FORMAT");
        assert_eq!(format_from_env(), LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_format_from_env() {
        std::env::set_var("TRENDCAST_LOG_FORMAT", "json");
        let format = format_from_env();
        std::env::remove_var("TRENDCAST_LOG_FORMAT");
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_garbage_format_falls_back_to_text() {
        std::env::set_var("TRENDCAST_LOG_FORMAT", "xml");
        let format = format_from_env();
        std::env::remove_var("TRENDCAST_LOG_FORMAT");
        assert_eq!(format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_verbose_forces_debug_floor() {
        std::env::set_var("TRENDCAST_LOG_LEVEL", "error");
        let filter = level_filter(true);
        std::env::remove_var("TRENDCAST_LOG_LEVEL");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_level_comes_from_env() {
        std::env::remove_var("RUST_LOG");
        std::env::set_var("TRENDCAST_LOG_LEVEL", "warn");
        let filter = level_filter(false);
        std::env::remove_var("TRENDCAST_LOG_LEVEL");
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    #[serial]
    fn test_level_defaults_to_info() {
        std::env::remove_var("RUST_LOG");
        std::env::remove_var("TRENDCAST_LOG_LEVEL");
        assert_eq!(level_filter(false).to_string(), "info");
    }
}
