//! `lynx` command-line entry point.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use lynx_cli::commands::{run_pipeline, validate_csv};
use lynx_cli::logging::{LogConfig, LogFormat, init_logging};
use lynx_cli::types::ValidateRequest;
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, RunArgs, ValidateArgs};
use crate::summary::{print_run_summary, print_validation_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let outcome = match &cli.command {
        Command::Run(args) => run(args),
        Command::Validate(args) => validate(args),
    };
    let exit_code = match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(args: &RunArgs) -> Result<i32> {
    let outcome = run_pipeline(&args.config, args.dry_run)?;
    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("serialize run state")?;
        println!("{json}");
    } else {
        print_run_summary(&outcome);
    }
    Ok(if outcome.succeeded() { 0 } else { 1 })
}

fn validate(args: &ValidateArgs) -> Result<i32> {
    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter {:?} is not a single ASCII character", args.delimiter))?;
    let request = ValidateRequest {
        schema: args.schema.clone(),
        metatype: args.metatype.clone(),
        csv: args.csv.clone(),
        delimiter,
        batch_size: args.batch_size,
        strict: args.strict,
    };
    let outcome = validate_csv(&request)?;
    print_validation_summary(&outcome);
    Ok(if outcome.errors.is_empty() { 0 } else { 1 })
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
