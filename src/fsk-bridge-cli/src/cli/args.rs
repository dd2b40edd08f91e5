//! CLI argument structures and parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::attach_cmd::AttachCli;
use crate::demo_cmd::DemoCli;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warn,
    /// Show informational messages, warnings, and errors (default)
    #[default]
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// FSK bridge - request/response over a shared filesystem.
#[derive(Debug, Parser)]
#[command(name = "fsk-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bridge configuration file (TOML)
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level; falls back to FSK_BRIDGE_LOG_LEVEL, then info
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Write trace-level logs to ./fsk-bridge-debug.log
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a scripted session against an in-process runtime
    Demo(DemoCli),

    /// Drive a runtime that shares a directory with this process
    Attach(AttachCli),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
    }

    #[test]
    fn test_parse_demo() {
        let cli = Cli::try_parse_from([
            "fsk-bridge",
            "--log-level",
            "debug",
            "demo",
            "--api-body",
            "print(2)",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        match cli.command {
            Commands::Demo(demo) => {
                assert_eq!(demo.path, "/");
                assert_eq!(demo.api_body, "print(2)");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_attach_requires_dir() {
        assert!(Cli::try_parse_from(["fsk-bridge", "attach"]).is_err());

        let cli =
            Cli::try_parse_from(["fsk-bridge", "attach", "--dir", "/tmp/fsk", "--debug"]).unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Attach(attach) => {
                assert_eq!(attach.dir, PathBuf::from("/tmp/fsk"));
                assert_eq!(attach.path, "/");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
