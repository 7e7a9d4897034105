// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `calcdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "calcdag",
    version,
    about = "Evaluate arithmetic expressions by scheduling their operations on polling workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Expressions to evaluate, e.g. "(2+3)*4-5".
    #[arg(value_name = "EXPR", required = true)]
    pub expressions: Vec<String>,

    /// Path to a config file (TOML).
    ///
    /// If omitted, built-in defaults plus environment overrides are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Number of in-process workers; overrides `[worker].computing_power`.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Give up waiting for results after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CALCDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse and print each task graph, but don't schedule anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
