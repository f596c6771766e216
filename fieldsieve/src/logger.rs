// fieldsieve/src/logger.rs
//! Logger setup for the CLI. All log output goes to stderr so that stdout
//! carries only the command result.
//! License: MIT OR APACHE 2.0

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger`.
///
/// `level` overrides `RUST_LOG` when given; otherwise `RUST_LOG` applies with
/// a default of `warn`. Calling this more than once is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.target(Target::Stderr).format_timestamp(None);
    let _ = builder.try_init();
}
