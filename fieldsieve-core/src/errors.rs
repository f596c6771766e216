//! errors.rs - Custom error types for the fieldsieve-core library.
//!
//! This module defines a structured error enum for the library. Only fatal
//! conditions live here: malformed rule strings, unknown sanitization filters
//! and duplicate custom registrations. Configuration files are loaded through
//! `anyhow` in `config.rs`.
//! Per-field validation failures are data (see `engine::ValidationError`) and
//! are never raised through this type.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use thiserror::Error;

/// Which of the two rule tables a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Sanitization,
    Validation,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuleKind::Sanitization => write!(f, "Sanitization"),
            RuleKind::Validation => write!(f, "Validation"),
        }
    }
}

/// This enum represents all fatal error types in the `fieldsieve-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SieveError {
    #[error("Invalid filter encountered at byte {position} of '{input}': {reason}")]
    Grammar {
        input: String,
        position: usize,
        reason: String,
    },

    #[error("Sanitization filter {0} does not exist.")]
    UnknownFilter(String),

    #[error("{kind} filter {name} already exists.")]
    DuplicateRule { kind: RuleKind, name: String },
}

impl SieveError {
    pub(crate) fn grammar(input: &str, position: usize, reason: impl Into<String>) -> Self {
        SieveError::Grammar {
            input: input.to_string(),
            position,
            reason: reason.into(),
        }
    }
}
