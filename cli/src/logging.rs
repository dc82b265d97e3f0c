//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with a pretty or JSON format and
//! `RUST_LOG`-based filtering.
//!
//! Log output goes to stderr; stdout carries the command's JSON result so it
//! can be piped into other tools.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Default filter directives for a verbosity choice.
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "edgematrix=debug,edgematrix_protocol=debug"
    } else {
        "edgematrix=info,edgematrix_protocol=warn"
    }
}

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. `RUST_LOG` overrides
/// `default_level` when set, using `EnvFilter` directive syntax:
///
/// ```text
/// RUST_LOG=edgematrix=debug,edgematrix_protocol=trace
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_raises_protocol_verbosity() {
        assert!(default_directives(true).contains("edgematrix_protocol=debug"));
        assert!(default_directives(false).contains("edgematrix_protocol=warn"));
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!(LogFormat::from_str("JSON", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("pretty", true), Ok(LogFormat::Pretty));
        assert!(LogFormat::from_str("xml", true).is_err());
    }
}
