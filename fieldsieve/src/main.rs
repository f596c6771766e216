// fieldsieve/src/main.rs
//! fieldsieve entry point.
//!
//! Exit codes: 0 when the record is valid (or the command succeeded), 1 when
//! the record failed validation, 2 on any other error.

use clap::Parser;
use is_terminal::IsTerminal;
use log::LevelFilter;
use std::io;
use std::process::ExitCode;

use fieldsieve::cli::{Cli, Commands};
use fieldsieve::commands::check::{run_check, CheckOutcome};
use fieldsieve::commands::rules::run_rules;
use fieldsieve::logger;
use fieldsieve::ui::output_format;

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = if args.quiet {
        Some(LevelFilter::Off)
    } else if args.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    let result = match &args.command {
        Commands::Check(cmd) => run_check(cmd).map(|outcome| match outcome {
            CheckOutcome::Valid => ExitCode::SUCCESS,
            CheckOutcome::Invalid => ExitCode::from(1),
        }),
        Commands::Rules(cmd) => run_rules(cmd).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            let stderr = io::stderr();
            let supports_color = stderr.is_terminal();
            let _ = output_format::print_error_message(&mut stderr.lock(), &format!("{e:#}"), supports_color);
            ExitCode::from(2)
        }
    }
}
