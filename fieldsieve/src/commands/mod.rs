// fieldsieve/src/commands/mod.rs
pub mod check;
pub mod rules;

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use fieldsieve_core::{merge_configs, SieveConfig, ValidationEngine};

/// Loads every configuration file in order, later files overriding earlier
/// ones, and builds an engine from the result.
pub fn load_engine(paths: &[PathBuf]) -> Result<ValidationEngine> {
    let mut config = SieveConfig::default();
    for path in paths {
        let user_config = SieveConfig::load_from_file(path)?;
        config = merge_configs(config, Some(user_config));
    }
    debug!("Building engine for {} configured fields.", config.fields.len());

    ValidationEngine::from_config(&config).context("Failed to apply field configuration")
}
