// fieldsieve-core/src/lib.rs
//! # fieldsieve Core Library
//!
//! `fieldsieve-core` sanitizes and validates keyed input records (form posts,
//! API payloads) against declarative rule strings such as
//! `"trim|email"` and `"required|minlen:5;'{field} is too short'"`.
//!
//! A run first feeds every configured field through its sanitizers in order,
//! then checks the sanitized record against the field's validators, and
//! finally yields either the cleaned record or a list of structured errors
//! with rendered messages.
//!
//! ## Modules
//!
//! * `grammar`: Parses rule strings into [`RuleDescriptor`]s and serializes them back.
//! * `synonyms`: Alias table shared by rule names and rule arguments.
//! * `registry`: Resolves rule names to built-in, custom or host-function implementations.
//! * `fields`: Per-field label and rule lists.
//! * `catalog`: Message templates and placeholder rendering.
//! * `engine`: The [`ValidationEngine`] that runs everything.
//! * `filters` / `validators`: The built-in sanitizers and validators.
//! * `config`: Field configuration files (YAML or JSON).
//! * `headless`: One-shot helpers.
//! * `errors`: The crate error type.
//!
//! ## Usage Example
//!
//! ```rust
//! use fieldsieve_core::{FieldSpec, FieldSpecs, ValidationEngine};
//! use serde_json::json;
//!
//! fn main() -> Result<(), fieldsieve_core::SieveError> {
//!     let mut specs = FieldSpecs::new();
//!     specs.insert(
//!         "email".to_string(),
//!         FieldSpec::new().sanitizations("trim|email").validations("required|email"),
//!     );
//!     specs.insert("age".to_string(), FieldSpec::new().validations("integer"));
//!
//!     let mut engine = ValidationEngine::new();
//!     engine.configure(&specs)?;
//!
//!     let input = json!({"email": " Foo@Bar.com ", "age": "abc"});
//!     let outcome = engine.run(input.as_object().unwrap(), false)?;
//!     assert!(outcome.is_none());
//!     assert_eq!(engine.errors().len(), 1);
//!     assert_eq!(engine.errors()[0].rule_name, "integer");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Configuration and sanitization problems are returned as [`SieveError`].
//! Validation failures are data: they are collected as [`ValidationError`]s
//! and never abort a run.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fields;
pub mod filters;
pub mod grammar;
pub mod headless;
mod host;
pub mod registry;
pub mod synonyms;
pub mod validators;

/// A keyed input record. Field order is preserved.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Re-exports the configuration types and loaders.
pub use config::{merge_configs, FieldSpec, FieldSpecs, SieveConfig};

/// Re-exports the crate error type.
pub use errors::{RuleKind, SieveError};

/// Re-exports the engine and its error records.
pub use engine::{ErrorKind, ErrorMarkup, ValidationEngine, ValidationError};

pub use fields::{humanize_label, FieldRuleSet, MergePosition};

pub use grammar::{parse_rules, to_rule_string, RuleDescriptor};

/// Re-exports the rule registry for embedders that want an isolated one.
pub use registry::{BuiltinSanitizer, BuiltinValidator, ResolvedRule, RuleRegistry};

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{sanitize_once, validate_once};
