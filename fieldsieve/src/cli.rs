// fieldsieve/src/cli.rs
//! This file defines the command-line interface (CLI) for the fieldsieve
//! application, including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "fieldsieve",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sanitize and validate JSON records against field rules",
    long_about = "fieldsieve reads a JSON object, runs each configured field through its sanitization rules (trim, email, integer, ...) and then checks the result against its validation rules (required, email, minlen:5, ...). Field rules come from a YAML or JSON configuration file.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `fieldsieve` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes and validates one JSON record.
    #[command(about = "Sanitize and validate a JSON record read from a file or stdin.")]
    Check(CheckCommand),

    /// Prints the parsed rules of a configuration.
    #[command(about = "Print the parsed field rules of a configuration as a table.")]
    Rules(RulesCommand),
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Field configuration files; later files override earlier ones field by field.
    #[arg(long = "config", short = 'c', value_name = "FILE", required = true, help = "Field configuration file (YAML, or JSON by extension). May be repeated.")]
    pub config: Vec<PathBuf>,

    /// Path to an input file (reads from stdin if not provided).
    #[arg(long = "input", short = 'i', value_name = "FILE", help = "Read the JSON record from a file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Report input fields that have no configured rules.
    #[arg(long = "check-unknown", help = "Report input fields that have no configured rules.")]
    pub check_unknown: bool,

    /// Output format.
    #[arg(long = "format", short = 'f', value_enum, default_value = "text", help = "Output format for errors.")]
    pub format: OutputFormat,
}

/// Arguments for the `rules` command.
#[derive(Parser, Debug)]
pub struct RulesCommand {
    /// Field configuration files; later files override earlier ones field by field.
    #[arg(long = "config", short = 'c', value_name = "FILE", required = true, help = "Field configuration file (YAML, or JSON by extension). May be repeated.")]
    pub config: Vec<PathBuf>,
}

/// How `check` reports validation errors.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `field: message` line per error.
    Text,
    /// A JSON array of error objects.
    Json,
}
