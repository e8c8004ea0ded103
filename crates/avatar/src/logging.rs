//! Logging initialization.
//!
//! Uses the `tracing` ecosystem with human-readable or JSON output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `level` - Default level when RUST_LOG is not set.
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr (stdout is reserved for reports)
/// - The RUST_LOG environment variable overrides the level
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from config, with CLI overrides.
pub fn init_from_config(
    config: &avatar_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = effective_level(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

/// `--verbose` raises the level to debug but never lowers trace.
fn effective_level(configured: &str, verbose: bool) -> &str {
    match (configured, verbose) {
        ("trace", _) => "trace",
        (_, true) => "debug",
        (level, false) => level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_to_debug() {
        assert_eq!(effective_level("info", true), "debug");
        assert_eq!(effective_level("warn", false), "warn");
    }

    #[test]
    fn verbose_keeps_trace() {
        assert_eq!(effective_level("trace", true), "trace");
    }
}
