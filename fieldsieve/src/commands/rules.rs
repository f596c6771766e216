//! The `rules` command: show how a configuration was parsed.
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use std::io::{self, Write};

use crate::cli::RulesCommand;
use crate::commands::load_engine;
use crate::ui::rule_table::build_rule_table;

pub fn run_rules(cmd: &RulesCommand) -> Result<()> {
    let engine = load_engine(&cmd.config)?;
    let table = build_rule_table(&engine);

    let mut writer = io::stdout().lock();
    writeln!(writer, "{table}")?;
    Ok(())
}
