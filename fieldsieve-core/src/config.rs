// fieldsieve-core/src/config.rs
//! Field configuration: which rules apply to which input field.
//!
//! A configuration maps field ids to an optional label and two optional rule
//! strings. Files are YAML by default; a `.json` extension selects JSON.
//!
//! ```yaml
//! fields:
//!   email:
//!     sanitizations: "trim|email"
//!     validations: "required|email"
//!   age:
//!     label: "Your age"
//!     validations: "integer;'{field} must be a whole number'"
//! ```
//!
//! License: MIT OR APACHE 2.0

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::RuleKind;
use crate::grammar::parse_rules;

/// Configuration for a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitizations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations: Option<String>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn sanitizations(mut self, rules: impl Into<String>) -> Self {
        self.sanitizations = Some(rules.into());
        self
    }

    pub fn validations(mut self, rules: impl Into<String>) -> Self {
        self.validations = Some(rules.into());
        self
    }
}

/// Field id to field configuration, in declaration order.
pub type FieldSpecs = IndexMap<String, FieldSpec>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SieveConfig {
    #[serde(default)]
    pub fields: FieldSpecs,
}

impl SieveConfig {
    /// Loads a configuration file, JSON for `.json` files and YAML otherwise.
    ///
    /// Every rule string is parsed once here so that grammar mistakes are
    /// reported with the file name instead of at first use.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading field configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!("Loaded {} fields from file {}.", config.fields.len(), path.display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SieveConfig = serde_yml::from_str(text)?;
        validate_specs(&config.fields)?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SieveConfig = serde_json::from_str(text)?;
        validate_specs(&config.fields)?;
        Ok(config)
    }
}

/// Overlays `user_config` on `base`. A field present in both takes each
/// attribute from the overlay when the overlay sets it.
pub fn merge_configs(base: SieveConfig, user_config: Option<SieveConfig>) -> SieveConfig {
    let mut fields = base.fields;
    let Some(user_config) = user_config else {
        return SieveConfig { fields };
    };

    debug!("Merging {} user fields into {} base fields.", user_config.fields.len(), fields.len());
    for (field, spec) in user_config.fields {
        let merged = fields.entry(field).or_default();
        if spec.label.is_some() {
            merged.label = spec.label;
        }
        if spec.sanitizations.is_some() {
            merged.sanitizations = spec.sanitizations;
        }
        if spec.validations.is_some() {
            merged.validations = spec.validations;
        }
    }

    SieveConfig { fields }
}

/// Parses every rule string and reports all grammar errors at once.
fn validate_specs(fields: &FieldSpecs) -> Result<()> {
    let mut errors = Vec::new();

    for (field, spec) in fields {
        if field.trim().is_empty() {
            errors.push("A field has an empty id.".to_string());
            continue;
        }
        let rule_strings = [
            (spec.sanitizations.as_deref(), RuleKind::Sanitization),
            (spec.validations.as_deref(), RuleKind::Validation),
        ];
        for (rules, kind) in rule_strings {
            let Some(rules) = rules.filter(|r| !r.trim().is_empty()) else {
                continue;
            };
            if let Err(e) = parse_rules(rules, kind) {
                errors.push(format!("Field '{}': {}", field, e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Invalid field configuration:\n{}", errors.join("\n")))
    }
}
