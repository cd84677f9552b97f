// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagrun",
    version,
    about = "Run the stale tasks of a dependency graph and remember what ran.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = crate::config::loader::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// State document to use instead of `[dag].backend`.
    #[arg(long, value_name = "PATH")]
    pub backend: Option<String>,

    /// Restrict the run to this task or file and what it depends on.
    ///
    /// May be given several times. Relative file paths resolve against the
    /// config file's directory.
    #[arg(long = "target", value_name = "LABEL")]
    pub targets: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the dependency graph in Graphviz DOT form and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub graph: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
