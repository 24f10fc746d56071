//! Logging configuration.

use clap::{Args, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging options. Verbosity follows `RUST_LOG`.
#[derive(Debug, Clone, Args)]
pub struct LogConfig {
    /// Log output format.
    #[arg(long = "log-format", env = "BLOCKFLOW_LOG_FORMAT", value_enum, default_value_t)]
    pub format: LogFormat,
}
