//! registry.rs - Resolves rule names to the callables that implement them.
//!
//! Built-in rules are closed enumerations mapped to plain function pointers
//! when the registry is constructed. Custom rules and host functions live in
//! an append-only table behind a `RwLock`; registration is a check-and-insert
//! performed while holding the write lock, so two concurrent registrations of
//! the same name cannot both succeed.
//!
//! A process-wide registry is available through [`RuleRegistry::global`].
//! Tests and embedders that need isolation create their own with
//! [`RuleRegistry::new`] and hand it to the engine.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::catalog::DEFAULT_LONG;
use crate::errors::{RuleKind, SieveError};
use crate::synonyms;
use crate::{filters, host, validators, Record};

/// Signature of a built-in sanitizer.
pub type SanitizeFn = fn(&Value, &[String]) -> Value;
/// Signature of a built-in validator: field name, whole record, arguments.
pub type ValidateFn = fn(&str, &Record, &[String]) -> bool;
/// Signature of a host function: a plain string transform invoked with the value only.
pub type HostFn = fn(&str) -> String;

pub type CustomSanitizer = Arc<dyn Fn(&Value, &[String]) -> Value + Send + Sync>;
pub type CustomValidator = Arc<dyn Fn(&str, &Record, &[String]) -> bool + Send + Sync>;

/// The closed set of built-in sanitizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinSanitizer {
    BasicHtmlTags,
    Default,
    Email,
    Float,
    HtmlEncode,
    Integer,
    NoiseWords,
    NoPunctuation,
    Number,
    String,
    Trim,
    UrlEncode,
}

impl BuiltinSanitizer {
    pub const ALL: [BuiltinSanitizer; 12] = [
        Self::BasicHtmlTags,
        Self::Default,
        Self::Email,
        Self::Float,
        Self::HtmlEncode,
        Self::Integer,
        Self::NoiseWords,
        Self::NoPunctuation,
        Self::Number,
        Self::String,
        Self::Trim,
        Self::UrlEncode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BasicHtmlTags => "basichtmltags",
            Self::Default => "default",
            Self::Email => "email",
            Self::Float => "float",
            Self::HtmlEncode => "htmlencode",
            Self::Integer => "integer",
            Self::NoiseWords => "noisewords",
            Self::NoPunctuation => "nopunctuation",
            Self::Number => "number",
            Self::String => "string",
            Self::Trim => "trim",
            Self::UrlEncode => "urlencode",
        }
    }

    pub fn function(self) -> SanitizeFn {
        match self {
            Self::BasicHtmlTags => filters::basic_html_tags,
            Self::Default => filters::default_value,
            Self::Email => filters::email,
            Self::Float => filters::float,
            Self::HtmlEncode => filters::html_encode,
            Self::Integer => filters::integer,
            Self::NoiseWords => filters::noise_words,
            Self::NoPunctuation => filters::no_punctuation,
            Self::Number => filters::number,
            Self::String => filters::string,
            Self::Trim => filters::trim,
            Self::UrlEncode => filters::url_encode,
        }
    }
}

/// The closed set of built-in validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinValidator {
    Alphabetic,
    Alphanumeric,
    Boolean,
    CreditCard,
    Date,
    Email,
    EndsWith,
    EqualsField,
    ExactLen,
    FileExtension,
    Float,
    GuidV4,
    Iban,
    InList,
    Integer,
    Ip,
    Ipv4,
    Ipv6,
    JsonString,
    MaxLen,
    MaxNumeric,
    MinAge,
    MinLen,
    MinNumeric,
    NotInList,
    Numeric,
    PersonName,
    PhoneNumber,
    Regex,
    Required,
    RequiredFile,
    StartsWith,
    StreetAddress,
    Url,
    UrlExists,
}

impl BuiltinValidator {
    pub const ALL: [BuiltinValidator; 35] = [
        Self::Alphabetic,
        Self::Alphanumeric,
        Self::Boolean,
        Self::CreditCard,
        Self::Date,
        Self::Email,
        Self::EndsWith,
        Self::EqualsField,
        Self::ExactLen,
        Self::FileExtension,
        Self::Float,
        Self::GuidV4,
        Self::Iban,
        Self::InList,
        Self::Integer,
        Self::Ip,
        Self::Ipv4,
        Self::Ipv6,
        Self::JsonString,
        Self::MaxLen,
        Self::MaxNumeric,
        Self::MinAge,
        Self::MinLen,
        Self::MinNumeric,
        Self::NotInList,
        Self::Numeric,
        Self::PersonName,
        Self::PhoneNumber,
        Self::Regex,
        Self::Required,
        Self::RequiredFile,
        Self::StartsWith,
        Self::StreetAddress,
        Self::Url,
        Self::UrlExists,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Alphabetic => "alphabetic",
            Self::Alphanumeric => "alphanumeric",
            Self::Boolean => "boolean",
            Self::CreditCard => "creditcard",
            Self::Date => "date",
            Self::Email => "email",
            Self::EndsWith => "endswith",
            Self::EqualsField => "equalsfield",
            Self::ExactLen => "exactlen",
            Self::FileExtension => "fileextension",
            Self::Float => "float",
            Self::GuidV4 => "guidv4",
            Self::Iban => "iban",
            Self::InList => "inlist",
            Self::Integer => "integer",
            Self::Ip => "ip",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::JsonString => "jsonstring",
            Self::MaxLen => "maxlen",
            Self::MaxNumeric => "maxnumeric",
            Self::MinAge => "minage",
            Self::MinLen => "minlen",
            Self::MinNumeric => "minnumeric",
            Self::NotInList => "notinlist",
            Self::Numeric => "numeric",
            Self::PersonName => "personname",
            Self::PhoneNumber => "phonenumber",
            Self::Regex => "regex",
            Self::Required => "required",
            Self::RequiredFile => "requiredfile",
            Self::StartsWith => "startswith",
            Self::StreetAddress => "streetaddress",
            Self::Url => "url",
            Self::UrlExists => "urlexists",
        }
    }

    pub fn function(self) -> ValidateFn {
        match self {
            Self::Alphabetic => validators::alphabetic,
            Self::Alphanumeric => validators::alphanumeric,
            Self::Boolean => validators::boolean,
            Self::CreditCard => validators::credit_card,
            Self::Date => validators::date,
            Self::Email => validators::email,
            Self::EndsWith => validators::ends_with,
            Self::EqualsField => validators::equals_field,
            Self::ExactLen => validators::exact_len,
            Self::FileExtension => validators::file_extension,
            Self::Float => validators::float,
            Self::GuidV4 => validators::guid_v4,
            Self::Iban => validators::iban,
            Self::InList => validators::in_list,
            Self::Integer => validators::integer,
            Self::Ip => validators::ip,
            Self::Ipv4 => validators::ipv4,
            Self::Ipv6 => validators::ipv6,
            Self::JsonString => validators::json_string,
            Self::MaxLen => validators::max_len,
            Self::MaxNumeric => validators::max_numeric,
            Self::MinAge => validators::min_age,
            Self::MinLen => validators::min_len,
            Self::MinNumeric => validators::min_numeric,
            Self::NotInList => validators::not_in_list,
            Self::Numeric => validators::numeric,
            Self::PersonName => validators::person_name,
            Self::PhoneNumber => validators::phone_number,
            Self::Regex => validators::regex,
            Self::Required => validators::required,
            Self::RequiredFile => validators::required_file,
            Self::StartsWith => validators::starts_with,
            Self::StreetAddress => validators::street_address,
            Self::Url => validators::url,
            Self::UrlExists => validators::url_exists,
        }
    }

    /// Presence checks run even when the field is absent or blank.
    pub fn checks_presence(self) -> bool {
        matches!(self, Self::Required | Self::RequiredFile)
    }
}

/// What a sanitization rule name resolved to.
#[derive(Clone)]
pub enum SanitizerHandle {
    Builtin(BuiltinSanitizer),
    Custom(CustomSanitizer),
    Host(HostFn),
}

/// What a validation rule name resolved to.
#[derive(Clone)]
pub enum ValidatorHandle {
    Builtin(BuiltinValidator),
    Custom {
        callback: CustomValidator,
        default_message: String,
    },
}

/// A rule ready for execution: canonical name, synonym-expanded arguments
/// and the implementation handle. Transient; never stored by the engine.
#[derive(Clone)]
pub struct ResolvedRule<H> {
    pub canonical_name: String,
    pub arguments: Vec<String>,
    pub handle: H,
}

impl ResolvedRule<SanitizerHandle> {
    /// Applies the sanitizer to one leaf value.
    pub fn apply(&self, value: &Value) -> Value {
        match &self.handle {
            SanitizerHandle::Builtin(builtin) => (builtin.function())(value, &self.arguments),
            SanitizerHandle::Custom(callback) => callback(value, &self.arguments),
            SanitizerHandle::Host(function) => match value {
                Value::String(s) => Value::String(function(s)),
                other => other.clone(),
            },
        }
    }

    pub fn origin(&self) -> &'static str {
        match self.handle {
            SanitizerHandle::Builtin(_) => "builtin",
            SanitizerHandle::Custom(_) => "custom",
            SanitizerHandle::Host(_) => "host",
        }
    }
}

impl ResolvedRule<ValidatorHandle> {
    pub fn check(&self, field: &str, input: &Record) -> bool {
        match &self.handle {
            ValidatorHandle::Builtin(builtin) => (builtin.function())(field, input, &self.arguments),
            ValidatorHandle::Custom { callback, .. } => callback(field, input, &self.arguments),
        }
    }

    /// Whether the rule runs for absent or blank fields.
    pub fn checks_presence(&self) -> bool {
        match self.handle {
            ValidatorHandle::Builtin(builtin) => builtin.checks_presence(),
            ValidatorHandle::Custom { .. } => false,
        }
    }

    /// The message registered with a custom validator.
    pub fn custom_message(&self) -> Option<&str> {
        match &self.handle {
            ValidatorHandle::Builtin(_) => None,
            ValidatorHandle::Custom { default_message, .. } => Some(default_message),
        }
    }

    pub fn origin(&self) -> &'static str {
        match self.handle {
            ValidatorHandle::Builtin(_) => "builtin",
            ValidatorHandle::Custom { .. } => "custom",
        }
    }
}

#[derive(Default)]
struct CustomRules {
    sanitizers: HashMap<String, CustomSanitizer>,
    validators: HashMap<String, (CustomValidator, String)>,
    host_functions: HashMap<String, HostFn>,
}

/// Built-in, custom and host-function rules keyed by canonical name.
pub struct RuleRegistry {
    sanitizers: HashMap<&'static str, BuiltinSanitizer>,
    validators: HashMap<&'static str, BuiltinValidator>,
    custom: RwLock<CustomRules>,
}

lazy_static! {
    /// The process-wide registry shared by every engine that is not given its own.
    static ref GLOBAL_REGISTRY: Arc<RuleRegistry> = Arc::new(RuleRegistry::new());
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let custom = self.read_custom();
        f.debug_struct("RuleRegistry")
            .field("builtin_sanitizers", &self.sanitizers.len())
            .field("builtin_validators", &self.validators.len())
            .field("custom_sanitizers", &custom.sanitizers.len())
            .field("custom_validators", &custom.validators.len())
            .field("host_functions", &custom.host_functions.len())
            .finish()
    }
}

impl RuleRegistry {
    /// Creates an isolated registry holding the built-ins and the default host functions.
    pub fn new() -> Self {
        let custom = CustomRules {
            host_functions: host::DEFAULT_HOST_FUNCTIONS
                .iter()
                .map(|(name, function)| (name.to_string(), *function))
                .collect(),
            ..CustomRules::default()
        };

        Self {
            sanitizers: BuiltinSanitizer::ALL.iter().map(|b| (b.name(), *b)).collect(),
            validators: BuiltinValidator::ALL.iter().map(|b| (b.name(), *b)).collect(),
            custom: RwLock::new(custom),
        }
    }

    /// Returns the process-wide registry.
    pub fn global() -> Arc<RuleRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    fn read_custom(&self) -> RwLockReadGuard<'_, CustomRules> {
        self.custom.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_custom(&self) -> RwLockWriteGuard<'_, CustomRules> {
        self.custom.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolves a sanitization rule.
    ///
    /// Order: built-in for the literal name, custom for the literal name,
    /// built-in for the synonym, host function for the literal name or the
    /// synonym.
    ///
    /// # Errors
    ///
    /// [`SieveError::UnknownFilter`] when nothing matches.
    pub fn resolve_sanitizer(
        &self,
        name: &str,
        arguments: &[String],
    ) -> Result<ResolvedRule<SanitizerHandle>, SieveError> {
        let name = name.to_lowercase();
        let synonym = synonyms::resolve(&name).into_owned();
        let custom = self.read_custom();

        let (canonical_name, handle) = if let Some(builtin) = self.sanitizers.get(name.as_str()) {
            (name, SanitizerHandle::Builtin(*builtin))
        } else if let Some(callback) = custom.sanitizers.get(&name) {
            (name, SanitizerHandle::Custom(Arc::clone(callback)))
        } else if let Some(builtin) = self.sanitizers.get(synonym.as_str()) {
            (synonym, SanitizerHandle::Builtin(*builtin))
        } else if let Some(function) = custom.host_functions.get(&name) {
            (name, SanitizerHandle::Host(*function))
        } else if let Some(function) = custom.host_functions.get(&synonym) {
            (synonym, SanitizerHandle::Host(*function))
        } else {
            return Err(SieveError::UnknownFilter(name));
        };

        debug!("Sanitization rule resolved to '{}'", canonical_name);
        Ok(ResolvedRule {
            canonical_name,
            arguments: synonyms::resolve_all(arguments),
            handle,
        })
    }

    /// Resolves a validation rule with the same order as sanitizers, minus
    /// host functions. `None` means the rule does not exist.
    pub fn resolve_validator(
        &self,
        name: &str,
        arguments: &[String],
    ) -> Option<ResolvedRule<ValidatorHandle>> {
        let name = name.to_lowercase();
        let synonym = synonyms::resolve(&name).into_owned();
        let custom = self.read_custom();

        let (canonical_name, handle) = if let Some(builtin) = self.validators.get(name.as_str()) {
            (name, ValidatorHandle::Builtin(*builtin))
        } else if let Some((callback, message)) = custom.validators.get(&name) {
            (
                name,
                ValidatorHandle::Custom {
                    callback: Arc::clone(callback),
                    default_message: message.clone(),
                },
            )
        } else if let Some(builtin) = self.validators.get(synonym.as_str()) {
            (synonym, ValidatorHandle::Builtin(*builtin))
        } else {
            return None;
        };

        Some(ResolvedRule {
            canonical_name,
            arguments: synonyms::resolve_all(arguments),
            handle,
        })
    }

    /// Registers a custom sanitizer under a lower-cased name.
    ///
    /// # Errors
    ///
    /// [`SieveError::DuplicateRule`] when a built-in or custom sanitizer
    /// already uses the name. The existing rule stays in effect.
    pub fn register_sanitizer<F>(&self, name: &str, callback: F) -> Result<(), SieveError>
    where
        F: Fn(&Value, &[String]) -> Value + Send + Sync + 'static,
    {
        let name = name.to_lowercase();
        let duplicate = || SieveError::DuplicateRule {
            kind: RuleKind::Sanitization,
            name: name.clone(),
        };
        if self.sanitizers.contains_key(name.as_str()) {
            return Err(duplicate());
        }

        let mut custom = self.write_custom();
        match custom.sanitizers.entry(name.clone()) {
            Entry::Occupied(_) => Err(duplicate()),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(callback));
                debug!("Registered custom sanitizer '{}'", name);
                Ok(())
            }
        }
    }

    /// Registers a custom validator under a lower-cased name.
    ///
    /// `default_message` is used when the rule occurrence carries no message
    /// of its own; without one the generic long-form message applies.
    ///
    /// # Errors
    ///
    /// [`SieveError::DuplicateRule`] when a built-in or custom validator
    /// already uses the name. The existing rule stays in effect.
    pub fn register_validator<F>(
        &self,
        name: &str,
        callback: F,
        default_message: Option<String>,
    ) -> Result<(), SieveError>
    where
        F: Fn(&str, &Record, &[String]) -> bool + Send + Sync + 'static,
    {
        let name = name.to_lowercase();
        let duplicate = || SieveError::DuplicateRule {
            kind: RuleKind::Validation,
            name: name.clone(),
        };
        if self.validators.contains_key(name.as_str()) {
            return Err(duplicate());
        }

        let message = default_message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_LONG.to_string());
        let mut custom = self.write_custom();
        match custom.validators.entry(name.clone()) {
            Entry::Occupied(_) => Err(duplicate()),
            Entry::Vacant(slot) => {
                slot.insert((Arc::new(callback), message));
                debug!("Registered custom validator '{}'", name);
                Ok(())
            }
        }
    }

    /// Adds a host function to the sanitizer escape hatch.
    ///
    /// # Errors
    ///
    /// [`SieveError::DuplicateRule`] when a host function of that name exists.
    pub fn register_host_function(&self, name: &str, function: HostFn) -> Result<(), SieveError> {
        let name = name.to_lowercase();
        let mut custom = self.write_custom();
        match custom.host_functions.entry(name.clone()) {
            Entry::Occupied(_) => Err(SieveError::DuplicateRule {
                kind: RuleKind::Sanitization,
                name,
            }),
            Entry::Vacant(slot) => {
                slot.insert(function);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_names_are_unique() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.sanitizers.len(), BuiltinSanitizer::ALL.len());
        assert_eq!(registry.validators.len(), BuiltinValidator::ALL.len());
    }

    #[test]
    fn literal_builtin_beats_synonym() {
        let registry = RuleRegistry::new();
        // `number` is also a synonym of `numeric`, but the literal sanitizer wins.
        let rule = registry.resolve_sanitizer("number", &[]).unwrap();
        assert_eq!(rule.canonical_name, "number");
        assert_eq!(rule.apply(&json!("a1-2b")), json!("1-2"));
    }

    #[test]
    fn synonyms_resolve_names_and_arguments() {
        let registry = RuleRegistry::new();
        let rule = registry.resolve_validator("INT", &[]).unwrap();
        assert_eq!(rule.canonical_name, "integer");

        let rule = registry
            .resolve_sanitizer("float", &["allow_thousand".to_string()])
            .unwrap();
        assert_eq!(rule.arguments, vec!["flag:allow_thousand".to_string()]);
    }

    #[test]
    fn host_functions_are_the_last_resort() {
        let registry = RuleRegistry::new();
        let rule = registry.resolve_sanitizer("upper", &[]).unwrap();
        assert_eq!(rule.origin(), "host");
        assert_eq!(rule.apply(&json!("abc")), json!("ABC"));
        assert_eq!(rule.apply(&json!(3)), json!(3));
    }

    #[test]
    fn unknown_sanitizer_is_an_error() {
        let registry = RuleRegistry::new();
        let err = registry.resolve_sanitizer("frobnicate", &[]).err().unwrap();
        assert!(matches!(err, SieveError::UnknownFilter(name) if name == "frobnicate"));
        assert!(registry.resolve_validator("frobnicate", &[]).is_none());
    }

    #[test]
    fn custom_rules_register_once() {
        let registry = RuleRegistry::new();
        registry
            .register_sanitizer("Shout", |v: &Value, _: &[String]| match v {
                Value::String(s) => json!(format!("{s}!")),
                other => other.clone(),
            })
            .unwrap();
        let rule = registry.resolve_sanitizer("shout", &[]).unwrap();
        assert_eq!(rule.origin(), "custom");
        assert_eq!(rule.apply(&json!("hi")), json!("hi!"));

        let again = registry.register_sanitizer("shout", |v: &Value, _: &[String]| v.clone());
        assert!(matches!(again, Err(SieveError::DuplicateRule { .. })));
        let builtin = registry.register_sanitizer("trim", |v: &Value, _: &[String]| v.clone());
        assert!(matches!(builtin, Err(SieveError::DuplicateRule { .. })));
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        use std::sync::Barrier;
        use std::thread;

        let registry = Arc::new(RuleRegistry::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let result = registry.register_validator(
                        "contested",
                        |_: &str, _: &Record, _: &[String]| true,
                        Some(format!("registered by {i}")),
                    );
                    (i, result)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<usize> = results
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(i, _)| *i)
            .collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter(|(_, result)| result.is_err())
            .all(|(_, result)| matches!(result, Err(SieveError::DuplicateRule { .. }))));

        let rule = registry.resolve_validator("contested", &[]).unwrap();
        let expected = format!("registered by {}", winners[0]);
        assert_eq!(rule.custom_message(), Some(expected.as_str()));
    }

    #[test]
    fn custom_validator_without_message_gets_long_default() {
        let registry = RuleRegistry::new();
        registry
            .register_validator("even", |_: &str, _: &Record, _: &[String]| true, None)
            .unwrap();
        let rule = registry.resolve_validator("even", &[]).unwrap();
        assert_eq!(rule.custom_message(), Some(DEFAULT_LONG));
        assert!(!rule.checks_presence());
    }
}
