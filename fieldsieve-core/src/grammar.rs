//! grammar.rs - Parser for the compact rule-specification strings.
//!
//! A rule string is a `|`-delimited list of rule specs. Each spec takes one of
//! the forms `name`, `name:args`, `name:args;'message'` or `name;'message'`:
//!
//! ```text
//! required|minlen:5;'Too short'|inlist:red,green,blue
//! ```
//!
//! The parser is a hand-rolled scanner rather than one large regular
//! expression. It always stops at the first plausible delimiter, so
//! `name:a,b;'msg'|next` splits into `name` / `a,b` / `msg` before `next`.
//! A backslash escapes the next character when it is one of `| : ; , ' " \`.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{RuleKind, SieveError};

const PIPE: u8 = b'|';
const COLON: u8 = b':';
const SEMICOLON: u8 = b';';
const COMMA: u8 = b',';
const BACKSLASH: u8 = b'\\';

/// Characters that lose their grammar meaning when preceded by a backslash.
const ESCAPABLE: &[u8] = b"|:;,'\"\\";

/// One parsed rule occurrence.
///
/// Descriptors are immutable once parsed. The name is lower-cased and never
/// empty; arguments are trimmed and never carry an unescaped delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleDescriptor {
    name: String,
    arguments: Vec<String>,
    error_message: Option<String>,
}

impl RuleDescriptor {
    /// Builds a descriptor without an error message override.
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            arguments,
            error_message: None,
        }
    }

    /// Attaches an error message override. Empty messages are treated as no override.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.error_message = if message.is_empty() { None } else { Some(message) };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Serializes this descriptor back into a single rule spec.
    pub fn to_spec(&self) -> String {
        let mut spec = escape(&self.name);
        if !self.arguments.is_empty() {
            spec.push(':');
            let args: Vec<String> = self.arguments.iter().map(|a| escape(a)).collect();
            spec.push_str(&args.join(","));
        }
        if let Some(message) = &self.error_message {
            spec.push_str(";'");
            spec.push_str(&escape_message(message));
            spec.push('\'');
        }
        spec
    }
}

impl fmt::Display for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_spec())
    }
}

/// Parses a rule string into an ordered list of rule descriptors.
///
/// Error messages are only retained for [`RuleKind::Validation`] rules. Specs
/// whose name starts with `/` are parsed but left out of the result.
///
/// # Errors
///
/// Returns [`SieveError::Grammar`] when the string holds no rule at all, when
/// a spec starts with `:` or `;`, or when a quoted message is never closed.
pub fn parse_rules(input: &str, kind: RuleKind) -> Result<Vec<RuleDescriptor>, SieveError> {
    let mut scanner = Scanner::new(input);
    let mut rules = Vec::new();
    let mut seen_spec = false;

    loop {
        scanner.skip_while(|b| b == PIPE || b.is_ascii_whitespace() || b == b'\'' || b == b'"');
        let Some(first) = scanner.peek() else { break };
        if first == COLON || first == SEMICOLON {
            return Err(SieveError::grammar(
                input,
                scanner.pos,
                "filter name cannot start with ':' or ';'",
            ));
        }

        let spec_start = scanner.pos;
        let raw_name = scanner.take_until(&[COLON, SEMICOLON, PIPE]);
        let name = unescape(raw_name.trim_matches(is_name_padding))
            .trim()
            .to_lowercase();
        if name.is_empty() {
            return Err(SieveError::grammar(input, spec_start, "empty filter name"));
        }

        let mut arguments = Vec::new();
        let mut message = None;

        if scanner.eat(COLON) {
            let raw_args = scanner.take_until(&[SEMICOLON, PIPE]);
            arguments = split_arguments(raw_args);
        }
        if scanner.eat(SEMICOLON) {
            message = scanner.take_message()?;
        }
        seen_spec = true;

        if name.starts_with('/') {
            debug!("Skipping excluded rule spec '{}'", name);
            continue;
        }

        let mut rule = RuleDescriptor::new(name, arguments);
        if kind == RuleKind::Validation {
            if let Some(message) = message {
                rule = rule.with_message(message);
            }
        }
        rules.push(rule);
    }

    if !seen_spec {
        return Err(SieveError::grammar(input, 0, "no filter found"));
    }

    debug!("Parsed {} {} rule(s) from '{}'", rules.len(), kind, input);
    Ok(rules)
}

/// Serializes descriptors into a rule string that [`parse_rules`] reads back unchanged.
pub fn to_rule_string(rules: &[RuleDescriptor]) -> String {
    rules
        .iter()
        .map(RuleDescriptor::to_spec)
        .collect::<Vec<_>>()
        .join("|")
}

fn is_name_padding(c: char) -> bool {
    c.is_whitespace() || c == '\'' || c == '"'
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn is_escape_at(&self, pos: usize) -> bool {
        self.bytes[pos] == BACKSLASH
            && self
                .bytes
                .get(pos + 1)
                .is_some_and(|next| ESCAPABLE.contains(next))
    }

    /// Consumes up to the first unescaped byte in `stops` (or the end) and
    /// returns the raw, still escaped, slice.
    fn take_until(&mut self, stops: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if self.is_escape_at(self.pos) {
                self.pos += 2;
                continue;
            }
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Reads the message segment that follows a `;`.
    fn take_message(&mut self) -> Result<Option<String>, SieveError> {
        self.skip_while(|b| b.is_ascii_whitespace());
        let message = match self.peek() {
            Some(quote @ (b'\'' | b'"')) => {
                let open = self.pos;
                let close = self.find_closing_quote(open + 1, quote).ok_or_else(|| {
                    SieveError::grammar(self.input, open, "unterminated error message")
                })?;
                let text = unescape(&self.input[open + 1..close]);
                self.pos = close + 1;
                self.skip_while(|b| b.is_ascii_whitespace());
                text
            }
            _ => unescape(self.take_until(&[PIPE])).trim().to_string(),
        };
        Ok(if message.is_empty() { None } else { Some(message) })
    }

    /// The closing quote is the first unescaped matching quote followed by
    /// optional whitespace and then the end of the spec.
    fn find_closing_quote(&self, from: usize, quote: u8) -> Option<usize> {
        let mut i = from;
        while i < self.bytes.len() {
            if self.is_escape_at(i) {
                i += 2;
                continue;
            }
            if self.bytes[i] == quote {
                let rest = &self.bytes[i + 1..];
                let ends_spec = match rest.iter().position(|b| !b.is_ascii_whitespace()) {
                    None => true,
                    Some(offset) => rest[offset] == PIPE,
                };
                if ends_spec {
                    return Some(i);
                }
            }
            i += 1;
        }
        None
    }
}

/// Splits an argument segment on unescaped commas. A blank segment yields no arguments.
fn split_arguments(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let bytes = raw.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == BACKSLASH && bytes.get(i + 1).is_some_and(|n| ESCAPABLE.contains(n)) {
            i += 2;
            continue;
        }
        if bytes[i] == COMMA {
            pieces.push(&raw[start..i]);
            start = i + 1;
        }
        i += 1;
    }
    pieces.push(&raw[start..]);

    pieces
        .into_iter()
        .map(|piece| unescape(piece.trim()).trim().to_string())
        .collect()
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii() && ESCAPABLE.contains(&(next as u8)) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn escape(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '|' | ':' | ';' | ',' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes a message for single-quoted output.
fn escape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        if matches!(c, '\'' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
