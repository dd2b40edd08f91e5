//! tracing subscriber setup.
//!
//! Normal runs log to stderr so rendered documents on stdout stay clean.
//! `--debug` traces the bridge into a file in the working directory and keeps
//! only warnings on stderr.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is not given.
pub const LOG_LEVEL_ENV: &str = "FSK_BRIDGE_LOG_LEVEL";

/// File the `--debug` log is written to, in the working directory.
pub const DEBUG_LOG_FILE: &str = "fsk-bridge-debug.log";

/// Everything from the bridge and the runtime console, warnings from the rest.
const DEBUG_FILTER: &str = "warn,fsk_bridge=trace,fsk_bridge_cli=trace,fsk_runtime=trace";

/// Guard that ensures the debug log file is flushed when dropped.
pub struct DebugLogGuard {
    _guard: WorkerGuard,
}

/// Pick the effective level: flag, then environment, then info.
pub fn resolve_level(flag: Option<LogLevel>, env_value: Option<&str>) -> LogLevel {
    flag.or_else(|| env_value.and_then(LogLevel::from_str_loose))
        .unwrap_or_default()
}

/// Install the global subscriber.
pub fn init(flag: Option<LogLevel>, debug_file: bool) -> Result<Option<DebugLogGuard>> {
    if debug_file {
        return setup_debug_file_logging().map(Some);
    }

    let env_level = std::env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(flag, env_level.as_deref());

    // RUST_LOG wins when set, for per-target filtering.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(None)
}

fn setup_debug_file_logging() -> Result<DebugLogGuard> {
    let dir = std::env::current_dir()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(DEBUG_LOG_FILE)
        .build(&dir)
        .with_context(|| format!("Cannot open {DEBUG_LOG_FILE} in {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(file_layer.with_filter(EnvFilter::new(DEBUG_FILTER)))
        .with(stderr_layer)
        .init();

    eprintln!("Debug log: {}", dir.join(DEBUG_LOG_FILE).display());
    Ok(DebugLogGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_beats_env() {
        assert_eq!(
            resolve_level(Some(LogLevel::Error), Some("trace")),
            LogLevel::Error
        );
    }

    #[test]
    fn test_env_used_without_flag() {
        assert_eq!(resolve_level(None, Some("Debug")), LogLevel::Debug);
        assert_eq!(resolve_level(None, Some("nonsense")), LogLevel::Info);
        assert_eq!(resolve_level(None, None), LogLevel::Info);
    }

    #[test]
    fn test_debug_filter_parses() {
        assert!(EnvFilter::try_new(DEBUG_FILTER).is_ok());
    }
}
