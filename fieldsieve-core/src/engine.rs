// fieldsieve-core/src/engine.rs
//! The validation engine: configured fields, the sanitize pass, the validate
//! pass and error reporting.
//!
//! An engine owns an ordered map of [`FieldRuleSet`]s and the error list of
//! its last run. Rule names are resolved against a shared [`RuleRegistry`]
//! every time they execute, so custom rules registered after configuration
//! are still picked up.
//!
//! Sanitization is all-or-nothing: an unknown sanitizer aborts the pass with
//! [`SieveError::UnknownFilter`]. Validation never aborts; every failure,
//! including an unknown validation rule, becomes a [`ValidationError`].
//!
//! License: MIT OR APACHE 2.0

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{self, DEFAULT_LONG, INEXISTENT_VALIDATION, MISMATCH};
use crate::config::{FieldSpecs, SieveConfig};
use crate::errors::{RuleKind, SieveError};
use crate::fields::{humanize_label, FieldRuleSet, MergePosition};
use crate::grammar::{parse_rules, RuleDescriptor};
use crate::registry::{ResolvedRule, RuleRegistry, SanitizerHandle};
use crate::Record;

/// Why a [`ValidationError`] was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A known rule rejected the value.
    RuleFailed,
    /// The validation rule name resolved to nothing.
    UnknownRule,
    /// The input carried a field with no configured rules.
    FieldMismatch,
}

/// One failed (field, rule) pair from the last run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    /// The value as displayed in messages; `"empty"` for absent or blank values.
    pub value: String,
    pub rule_name: String,
    pub arguments: Vec<String>,
    pub kind: ErrorKind,
    /// The rendered message chosen for this failure.
    pub message: String,
}

/// CSS classes used by [`ValidationEngine::render_errors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMarkup {
    pub field_class: String,
    pub error_class: String,
}

impl Default for ErrorMarkup {
    fn default() -> Self {
        Self {
            field_class: "valigator-field".to_string(),
            error_class: "valigator-error-message".to_string(),
        }
    }
}

/// Runs sanitization and validation rules over input records.
pub struct ValidationEngine {
    fields: IndexMap<String, FieldRuleSet>,
    errors: Vec<ValidationError>,
    registry: Arc<RuleRegistry>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("fields", &self.fields)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

/// Renders the readable error sentences, joined, or nothing when the last
/// run was clean.
impl fmt::Display for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let joined = self.render_errors_joined(&ErrorMarkup::default());
        f.write_str(joined.as_deref().unwrap_or_default())
    }
}

impl ValidationEngine {
    /// Creates an unconfigured engine using the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(RuleRegistry::global())
    }

    /// Creates an unconfigured engine bound to the given registry.
    pub fn with_registry(registry: Arc<RuleRegistry>) -> Self {
        Self {
            fields: IndexMap::new(),
            errors: Vec::new(),
            registry,
        }
    }

    /// Creates an engine from a loaded configuration.
    pub fn from_config(config: &SieveConfig) -> Result<Self, SieveError> {
        let mut engine = Self::new();
        engine.configure(&config.fields)?;
        Ok(engine)
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Registers a custom sanitizer in the process-wide registry.
    pub fn register_custom_sanitizer<F>(name: &str, callback: F) -> Result<(), SieveError>
    where
        F: Fn(&Value, &[String]) -> Value + Send + Sync + 'static,
    {
        RuleRegistry::global().register_sanitizer(name, callback)
    }

    /// Registers a custom validator in the process-wide registry.
    pub fn register_custom_validator<F>(
        name: &str,
        callback: F,
        default_message: Option<String>,
    ) -> Result<(), SieveError>
    where
        F: Fn(&str, &Record, &[String]) -> bool + Send + Sync + 'static,
    {
        RuleRegistry::global().register_validator(name, callback, default_message)
    }

    fn field_entry(&mut self, field: &str) -> &mut FieldRuleSet {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| FieldRuleSet::new(field))
    }

    /// Applies field specs: labels, then sanitizations appended, then
    /// validations appended.
    ///
    /// All rule strings are parsed before anything changes, so a grammar
    /// error leaves the engine as it was.
    pub fn configure(&mut self, specs: &FieldSpecs) -> Result<&mut Self, SieveError> {
        let mut parsed = Vec::with_capacity(specs.len());
        for (field, spec) in specs {
            let sanitizations = parse_optional(spec.sanitizations.as_deref(), RuleKind::Sanitization)?;
            let validations = parse_optional(spec.validations.as_deref(), RuleKind::Validation)?;
            parsed.push((field, spec.label.clone(), sanitizations, validations));
        }

        for (field, label, sanitizations, validations) in parsed {
            let entry = self.field_entry(field);
            if let Some(label) = label {
                entry.set_label(label);
            }
            entry.merge_sanitizations(sanitizations, MergePosition::Append);
            entry.merge_validations(validations, MergePosition::Append);
        }
        debug!("Engine configured with {} fields.", self.fields.len());
        Ok(self)
    }

    /// Sets or overwrites display labels.
    pub fn set_labels<I, K, V>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (field, label) in labels {
            self.field_entry(field.as_ref()).set_label(label);
        }
        self
    }

    /// Adds sanitization rules, after the existing ones or, with
    /// `merge_before`, ahead of them.
    pub fn set_sanitizations<I, K, V>(&mut self, rules: I, merge_before: bool) -> Result<&mut Self, SieveError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let parsed = parse_all(rules, RuleKind::Sanitization)?;
        for (field, descriptors) in parsed {
            self.field_entry(&field)
                .merge_sanitizations(descriptors, MergePosition::from(merge_before));
        }
        Ok(self)
    }

    /// Appends validation rules.
    pub fn set_validations<I, K, V>(&mut self, rules: I) -> Result<&mut Self, SieveError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let parsed = parse_all(rules, RuleKind::Validation)?;
        for (field, descriptors) in parsed {
            self.field_entry(&field)
                .merge_validations(descriptors, MergePosition::Append);
        }
        Ok(self)
    }

    /// Empties the sanitization lists of the given fields, or of every field.
    /// Unknown field ids are ignored.
    pub fn clear_sanitizations(&mut self, fields: Option<&[&str]>) -> &mut Self {
        self.for_each_field(fields, FieldRuleSet::clear_sanitizations);
        self
    }

    /// Empties the validation lists of the given fields, or of every field.
    pub fn clear_validations(&mut self, fields: Option<&[&str]>) -> &mut Self {
        self.for_each_field(fields, FieldRuleSet::clear_validations);
        self
    }

    fn for_each_field(&mut self, fields: Option<&[&str]>, f: impl Fn(&mut FieldRuleSet)) {
        match fields {
            None => self.fields.values_mut().for_each(f),
            Some(ids) => {
                for id in ids {
                    if let Some(set) = self.fields.get_mut(*id) {
                        f(set);
                    }
                }
            }
        }
    }

    pub fn field(&self, field: &str) -> Option<&FieldRuleSet> {
        self.fields.get(field)
    }

    /// Configured fields in configuration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRuleSet)> {
        self.fields.iter().map(|(id, set)| (id.as_str(), set))
    }

    /// Errors recorded by the last validation pass.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn label_for(&self, field: &str) -> String {
        match self.fields.get(field) {
            Some(set) => set.label().to_string(),
            None => humanize_label(field),
        }
    }

    /// Runs every configured field's sanitizers over a copy of `input`.
    ///
    /// Fields without configuration and configured fields missing from the
    /// input are left alone. Array and object values are sanitized element
    /// by element with the field's rule list.
    pub fn sanitize(&self, input: &Record) -> Result<Record, SieveError> {
        let mut output = input.clone();

        for (field, set) in &self.fields {
            let Some(value) = output.get_mut(field) else {
                continue;
            };
            for descriptor in set.sanitizations() {
                let rule = self
                    .registry
                    .resolve_sanitizer(descriptor.name(), descriptor.arguments())?;
                debug!("Sanitizing field '{}' with '{}'", field, rule.canonical_name);
                *value = apply_recursive(&rule, value);
            }
        }

        Ok(output)
    }

    /// Runs every configured field's validators against `input`.
    ///
    /// Clears the previous error list first. Returns the new errors on
    /// failure; they also stay available through [`errors`](Self::errors).
    pub fn validate(&mut self, input: &Record) -> Result<(), Vec<ValidationError>> {
        self.run_validations(input);
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    fn run_validations(&mut self, input: &Record) {
        let mut errors = Vec::new();

        for (field, set) in &self.fields {
            let value = input.get(field);
            let blank = is_blank(value);

            for descriptor in set.validations() {
                let Some(rule) = self
                    .registry
                    .resolve_validator(descriptor.name(), descriptor.arguments())
                else {
                    warn!("Validation rule '{}' for field '{}' does not exist.", descriptor.name(), field);
                    errors.push(self.rule_error(
                        field,
                        value,
                        descriptor.name(),
                        descriptor,
                        ErrorKind::UnknownRule,
                        INEXISTENT_VALIDATION,
                    ));
                    continue;
                };

                if blank && !rule.checks_presence() {
                    continue;
                }
                if rule.check(field, input) {
                    continue;
                }

                debug!("Field '{}' failed validation '{}'", field, rule.canonical_name);
                let template = descriptor
                    .error_message()
                    .or_else(|| rule.custom_message())
                    .or_else(|| catalog::lookup(descriptor.name()))
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_LONG);
                errors.push(self.rule_error(
                    field,
                    value,
                    &rule.canonical_name,
                    descriptor,
                    ErrorKind::RuleFailed,
                    template,
                ));
            }
        }

        self.errors = errors;
    }

    fn rule_error(
        &self,
        field: &str,
        value: Option<&Value>,
        rule_name: &str,
        descriptor: &RuleDescriptor,
        kind: ErrorKind,
        template: &str,
    ) -> ValidationError {
        let display = display_value(value);
        let message = catalog::render(
            template,
            &self.label_for(field),
            &display,
            rule_name,
            descriptor.arguments(),
        );
        ValidationError {
            field: field.to_string(),
            value: error_value(value, display),
            rule_name: rule_name.to_string(),
            arguments: descriptor.arguments().to_vec(),
            kind,
            message,
        }
    }

    fn record_mismatches(&mut self, input: &Record) {
        for (field, value) in input {
            let configured = self.fields.get(field).is_some_and(FieldRuleSet::has_rules);
            if configured {
                continue;
            }
            let display = display_value(Some(value));
            let message = catalog::render(MISMATCH, &self.label_for(field), &display, "mismatch", &[]);
            self.errors.push(ValidationError {
                field: field.clone(),
                value: error_value(Some(value), display),
                rule_name: "mismatch".to_string(),
                arguments: Vec::new(),
                kind: ErrorKind::FieldMismatch,
                message,
            });
        }
    }

    /// Sanitizes then validates `input`.
    ///
    /// With `check_unknown_fields`, every input field that has no configured
    /// rules adds a mismatch error. Returns the sanitized record when no
    /// error was recorded, `None` otherwise; the errors are then available
    /// through [`errors`](Self::errors) and the rendering methods.
    pub fn run(&mut self, input: &Record, check_unknown_fields: bool) -> Result<Option<Record>, SieveError> {
        let sanitized = self.sanitize(input)?;
        self.run_validations(&sanitized);
        if check_unknown_fields {
            self.record_mismatches(&sanitized);
        }

        if self.errors.is_empty() {
            Ok(Some(sanitized))
        } else {
            debug!("Run finished with {} errors.", self.errors.len());
            Ok(None)
        }
    }

    /// One canned sentence per error, with the field label wrapped in a
    /// `<span>` carrying `markup.field_class`.
    pub fn render_errors(&self, markup: &ErrorMarkup) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| {
                let label = format!(
                    "<span class=\"{}\">{}</span>",
                    markup.field_class,
                    self.label_for(&e.field)
                );
                catalog::readable_sentence(sentence_key(e), &label, &e.arguments)
            })
            .collect()
    }

    /// All rendered sentences, each wrapped in a `<span>` carrying
    /// `markup.error_class`, as one string. `None` when there are no errors.
    pub fn render_errors_joined(&self, markup: &ErrorMarkup) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let joined = self
            .render_errors(markup)
            .iter()
            .map(|sentence| format!("<span class=\"{}\">{}</span>", markup.error_class, sentence))
            .collect();
        Some(joined)
    }

    /// Plain-text sentence per field. A later error for the same field
    /// replaces an earlier one.
    pub fn errors_by_field(&self) -> IndexMap<String, String> {
        self.errors
            .iter()
            .map(|e| {
                let label = self.label_for(&e.field);
                let sentence = catalog::readable_sentence(sentence_key(e), &label, &e.arguments);
                (e.field.clone(), sentence)
            })
            .collect()
    }
}

fn sentence_key(error: &ValidationError) -> &str {
    match error.kind {
        ErrorKind::FieldMismatch => "mismatch",
        ErrorKind::RuleFailed | ErrorKind::UnknownRule => &error.rule_name,
    }
}

fn parse_optional(rules: Option<&str>, kind: RuleKind) -> Result<Vec<RuleDescriptor>, SieveError> {
    match rules {
        Some(rules) if !rules.trim().is_empty() => parse_rules(rules, kind),
        _ => Ok(Vec::new()),
    }
}

fn parse_all<I, K, V>(rules: I, kind: RuleKind) -> Result<Vec<(String, Vec<RuleDescriptor>)>, SieveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    rules
        .into_iter()
        .map(|(field, rules)| -> Result<_, SieveError> {
            let descriptors = parse_optional(Some(rules.as_ref()), kind)?;
            Ok((field.as_ref().to_string(), descriptors))
        })
        .collect()
}

fn apply_recursive(rule: &ResolvedRule<SanitizerHandle>, value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| apply_recursive(rule, v)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), apply_recursive(rule, v)))
                .collect(),
        ),
        leaf => rule.apply(leaf),
    }
}

/// Absent, null, whitespace-only strings and empty containers are blank.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// The value recorded on an error: `"empty"` for blank values.
fn error_value(value: Option<&Value>, display: String) -> String {
    if is_blank(value) {
        catalog::EMPTY_VALUE.to_string()
    } else {
        display
    }
}

/// The display form used in messages. Empty for absent or null values.
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| display_value(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
