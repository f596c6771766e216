//! The `check` command: sanitize and validate one JSON record.
//! License: MIT OR APACHE 2.0

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};

use fieldsieve_core::Record;

use crate::cli::CheckCommand;
use crate::commands::load_engine;
use crate::ui::output_format;

/// Outcome of a `check` run, mapped to the process exit code by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid,
    Invalid,
}

fn read_input(cmd: &CheckCommand) -> Result<String> {
    match &cmd.input_file {
        Some(path) => {
            info!("Reading input from file: {}", path.display());
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file {}", path.display()))
        }
        None => {
            info!("Reading input from stdin.");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Parses the input text as a JSON object.
pub fn parse_record(text: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(text).context("Input is not valid JSON")?;
    match value {
        Value::Object(record) => Ok(record),
        other => bail!("Input must be a JSON object, got {}", json_type(&other)),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Runs the engine over the input. The sanitized record goes to stdout on
/// success; the error report goes to stdout on failure.
pub fn run_check(cmd: &CheckCommand) -> Result<CheckOutcome> {
    let mut engine = load_engine(&cmd.config)?;
    let record = parse_record(&read_input(cmd)?)?;
    debug!("Input record has {} fields.", record.len());

    let outcome = engine
        .run(&record, cmd.check_unknown)
        .context("Sanitization failed")?;

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();

    match outcome {
        Some(sanitized) => {
            serde_json::to_writer_pretty(&mut writer, &sanitized)?;
            writeln!(writer)?;
            info!("Record is valid.");
            Ok(CheckOutcome::Valid)
        }
        None => {
            output_format::print_validation_errors(&mut writer, engine.errors(), cmd.format, supports_color)?;
            info!("Record failed validation with {} error(s).", engine.errors().len());
            Ok(CheckOutcome::Invalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record_rejects_non_objects() {
        assert!(parse_record(r#"{"a": 1}"#).is_ok());
        let err = parse_record("[1, 2]").unwrap_err();
        assert_eq!(err.to_string(), "Input must be a JSON object, got an array");
        assert!(parse_record("{oops").is_err());
    }
}
