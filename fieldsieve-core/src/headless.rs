// fieldsieve-core/src/headless.rs
//! One-shot helpers for callers that do not want to keep an engine around.
//!
//! Each call builds a throwaway [`ValidationEngine`] on the process-wide
//! registry, so custom rules registered through
//! [`ValidationEngine::register_custom_sanitizer`] and
//! [`ValidationEngine::register_custom_validator`] are available here too.
//!
//! License: MIT OR APACHE 2.0

use crate::engine::{ErrorMarkup, ValidationEngine};
use crate::errors::SieveError;
use crate::Record;

/// Sanitizes `data` with one rule string per field.
///
/// # Example
///
/// ```rust
/// use fieldsieve_core::sanitize_once;
/// use serde_json::json;
///
/// let data = json!({"name": "  ada  "}).as_object().cloned().unwrap();
/// let clean = sanitize_once(&data, [("name", "trim|ucfirst")]).unwrap();
/// assert_eq!(clean["name"], json!("Ada"));
/// ```
pub fn sanitize_once<I, K, V>(data: &Record, rules: I) -> Result<Record, SieveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut engine = ValidationEngine::new();
    engine.set_sanitizations(rules, false)?;
    engine.sanitize(data)
}

/// Validates `data` with one rule string per field.
///
/// Grammar errors are returned as `Err`. Otherwise the inner result is
/// `Ok(())` or the readable error sentences with the default markup.
pub fn validate_once<I, K, V>(data: &Record, rules: I) -> Result<Result<(), Vec<String>>, SieveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut engine = ValidationEngine::new();
    engine.set_validations(rules)?;
    match engine.run(data, false)? {
        Some(_) => Ok(Ok(())),
        None => Ok(Err(engine.render_errors(&ErrorMarkup::default()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn sanitize_once_applies_rules_in_order() {
        let clean = sanitize_once(&record(json!({"q": " a b "})), [("q", "trim|urlencode")]).unwrap();
        assert_eq!(clean["q"], json!("a%20b"));
    }

    #[test]
    fn validate_once_returns_sentences() {
        let data = record(json!({"age": "abc"}));
        let outcome = validate_once(&data, [("age", "integer")]).unwrap();
        assert_eq!(
            outcome.unwrap_err(),
            vec!["The <span class=\"valigator-field\">Age</span> field may only contain a numeric value".to_string()]
        );
        assert_eq!(validate_once(&record(json!({"age": "42"})), [("age", "int")]).unwrap(), Ok(()));
    }

    #[test]
    fn validate_once_surfaces_grammar_errors() {
        assert!(validate_once(&record(json!({})), [("a", ":bad")]).is_err());
    }
}
