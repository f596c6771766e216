// fieldsieve/tests/cli_integration_tests.rs
//! Command-line integration tests for the `fieldsieve` binary.
//!
//! The binary is run through `assert_cmd` with records fed on stdin or from a
//! temporary file, and field configuration written to temporary YAML or JSON
//! files with `tempfile`.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

const CONFIG_YAML: &str = r#"
fields:
  email:
    sanitizations: "trim|email"
    validations: "required|email"
  age:
    label: "Your age"
    sanitizations: "trim"
    validations: "integer|minnumeric:18"
"#;

fn write_config(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

fn run_fieldsieve(input: &str, args: &[&str]) -> Result<assert_cmd::assert::Assert> {
    let mut cmd = Command::cargo_bin("fieldsieve")?;
    cmd.env("RUST_LOG", "debug");
    cmd.args(args);
    cmd.write_stdin(input.as_bytes());
    Ok(cmd.assert())
}

#[test]
fn test_valid_record_prints_sanitized_json() -> Result<()> {
    let config = write_config(CONFIG_YAML)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_fieldsieve(
        r#"{"email": "  Foo@Bar.com ", "age": " 42 "}"#,
        &["check", "--config", config_path],
    )?
    .success()
    .get_output()
    .stdout
    .clone();

    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value, serde_json::json!({"email": "Foo@Bar.com", "age": "42"}));
    Ok(())
}

#[test]
fn test_invalid_record_exits_with_one() -> Result<()> {
    let config = write_config(CONFIG_YAML)?;
    let config_path = config.path().to_str().unwrap();

    run_fieldsieve(
        r#"{"email": "Foo@Bar.com", "age": "abc"}"#,
        &["check", "--config", config_path],
    )?
    .code(1)
    .stdout(predicate::str::contains("age: Your age may only contain an integer value"));
    Ok(())
}

#[test]
fn test_json_error_format() -> Result<()> {
    let config = write_config(CONFIG_YAML)?;
    let config_path = config.path().to_str().unwrap();

    let output = run_fieldsieve(
        r#"{"age": "12"}"#,
        &["check", "--config", config_path, "--format", "json"],
    )?
    .code(1)
    .get_output()
    .stdout
    .clone();

    let errors: serde_json::Value = serde_json::from_slice(&output)?;
    let rules: Vec<&str> = errors
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["rule_name"].as_str().unwrap())
        .collect();
    assert_eq!(rules, vec!["required", "minnumeric"]);
    Ok(())
}

#[test]
fn test_check_unknown_reports_extra_fields() -> Result<()> {
    let config = write_config(CONFIG_YAML)?;
    let config_path = config.path().to_str().unwrap();
    let input = r#"{"email": "a@b.co", "age": "30", "nickname": "ab"}"#;

    run_fieldsieve(input, &["check", "--config", config_path])?.success();
    run_fieldsieve(input, &["check", "--config", config_path, "--check-unknown"])?
        .code(1)
        .stdout(predicate::str::contains("nickname: There is no validation rule for Nickname"));
    Ok(())
}

#[test]
fn test_input_file_and_json_config() -> Result<()> {
    let mut config = Builder::new().suffix(".json").tempfile()?;
    config.write_all(br#"{"fields": {"name": {"sanitizations": "trim|ucwords", "validations": "required"}}}"#)?;
    let mut input = NamedTempFile::new()?;
    input.write_all(br#"{"name": "  ada lovelace "}"#)?;

    run_fieldsieve(
        "",
        &[
            "check",
            "--config",
            config.path().to_str().unwrap(),
            "--input",
            input.path().to_str().unwrap(),
        ],
    )?
    .success()
    .stdout(predicate::str::contains("\"Ada Lovelace\""));
    Ok(())
}

#[test]
fn test_later_config_overrides_earlier() -> Result<()> {
    let base = write_config(CONFIG_YAML)?;
    let overlay = write_config("fields:\n  age:\n    validations: \"integer\"\n")?;

    run_fieldsieve(
        r#"{"email": "a@b.co", "age": "12"}"#,
        &[
            "check",
            "--config",
            base.path().to_str().unwrap(),
            "--config",
            overlay.path().to_str().unwrap(),
        ],
    )?
    .success();
    Ok(())
}

#[test]
fn test_unknown_sanitizer_is_a_hard_error() -> Result<()> {
    let config = write_config("fields:\n  a:\n    sanitizations: \"frobnicate\"\n")?;

    run_fieldsieve(r#"{"a": "x"}"#, &["check", "--config", config.path().to_str().unwrap()])?
        .code(2)
        .stderr(predicate::str::contains("Sanitization filter frobnicate does not exist."));
    Ok(())
}

#[test]
fn test_grammar_error_names_the_field() -> Result<()> {
    let config = write_config("fields:\n  code:\n    validations: \"minlen:3;'open\"\n")?;

    run_fieldsieve("{}", &["check", "--config", config.path().to_str().unwrap()])?
        .code(2)
        .stderr(predicate::str::contains("Field 'code'"));
    Ok(())
}

#[test]
fn test_non_object_input_is_rejected() -> Result<()> {
    let config = write_config(CONFIG_YAML)?;

    run_fieldsieve("[1, 2]", &["check", "--config", config.path().to_str().unwrap()])?
        .code(2)
        .stderr(predicate::str::contains("Input must be a JSON object"));
    Ok(())
}

#[test]
fn test_rules_command_prints_table() -> Result<()> {
    let config = write_config(
        "fields:\n  age:\n    sanitizations: \"int|upper\"\n    validations: \"num|nosuch;'custom msg'\"\n",
    )?;

    run_fieldsieve("", &["rules", "--config", config.path().to_str().unwrap()])?
        .success()
        .stdout(predicate::str::contains("integer (builtin)"))
        .stdout(predicate::str::contains("upper (host)"))
        .stdout(predicate::str::contains("numeric (builtin)"))
        .stdout(predicate::str::contains("custom msg"))
        .stdout(predicate::str::contains("unknown"));
    Ok(())
}

#[test]
fn test_quiet_suppresses_logs() -> Result<()> {
    let config = write_config(CONFIG_YAML)?;

    run_fieldsieve(
        r#"{"email": "a@b.co"}"#,
        &["--quiet", "check", "--config", config.path().to_str().unwrap()],
    )?
    .success()
    .stderr(predicate::str::is_empty());
    Ok(())
}
