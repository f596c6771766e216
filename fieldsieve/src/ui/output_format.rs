//! Console output helpers: the error line on stderr and the validation
//! error report.
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::Write;

use fieldsieve_core::ValidationError;

use crate::cli::OutputFormat;

/// Prints an error message, in red when `supports_color` is set.
pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, supports_color: bool) -> Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", "error:".red().bold(), msg)?;
    } else {
        writeln!(writer, "error: {}", msg)?;
    }
    Ok(())
}

/// Writes the errors of a failed run.
///
/// Text output is one `field: message` line per error; JSON output is an
/// array of error objects.
pub fn print_validation_errors<W: Write>(
    writer: &mut W,
    errors: &[ValidationError],
    format: OutputFormat,
    supports_color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, errors)?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            for error in errors {
                if supports_color {
                    writeln!(writer, "{}: {}", error.field.yellow().bold(), error.message)?;
                } else {
                    writeln!(writer, "{}: {}", error.field, error.message)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsieve_core::ErrorKind;
    use test_log::test;

    fn sample_error() -> ValidationError {
        ValidationError {
            field: "age".to_string(),
            value: "abc".to_string(),
            rule_name: "integer".to_string(),
            arguments: Vec::new(),
            kind: ErrorKind::RuleFailed,
            message: "Age may only contain an integer value".to_string(),
        }
    }

    #[test]
    fn error_line_without_color() {
        let mut out = Vec::new();
        print_error_message(&mut out, "Failed to read config file a.yaml", false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "error: Failed to read config file a.yaml\n");
    }

    #[test]
    fn text_report_without_color() {
        let mut out = Vec::new();
        print_validation_errors(&mut out, &[sample_error()], OutputFormat::Text, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "age: Age may only contain an integer value\n");
    }

    #[test]
    fn json_report_is_an_array() {
        let mut out = Vec::new();
        print_validation_errors(&mut out, &[sample_error()], OutputFormat::Json, false).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["rule_name"], "integer");
        assert_eq!(parsed[0]["kind"], "rule_failed");
    }
}
