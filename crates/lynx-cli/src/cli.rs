//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "lynx",
    version,
    about = "Run ETL pipelines into the Deep Lynx import API",
    long_about = "Extract batches from CSV, JSON, HTTP or SQLite sources, map and \
                  validate them, and load them into a Deep Lynx data source.\n\n\
                  Credentials are read from LYNX_API_KEY and LYNX_API_SECRET, \
                  or a pre-issued LYNX_TOKEN."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a pipeline described by a TOML file.
    Run(RunArgs),

    /// Validate a CSV file against one metatype of a schema.
    Validate(ValidateArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Pipeline file.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Extract, transform and count, but send nothing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the final run state as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Schema file declaring the metatypes.
    #[arg(long = "schema", value_name = "FILE")]
    pub schema: PathBuf,

    /// Metatype to validate against.
    #[arg(long = "metatype", value_name = "NAME")]
    pub metatype: String,

    /// CSV file to check.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Field delimiter.
    #[arg(long = "delimiter", default_value_t = ',')]
    pub delimiter: char,

    /// Rows validated together; `unique` is checked within a batch.
    #[arg(long = "batch-size", default_value_t = 10_000)]
    pub batch_size: usize,

    /// Also report columns the metatype does not declare.
    #[arg(long = "strict")]
    pub strict: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
