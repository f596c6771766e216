//! synonyms.rs - Alias tokens for rule names and rule arguments.
//!
//! One table serves both purposes: a rule name such as `int` resolves to the
//! canonical `integer`, while an argument such as `allow_fraction` resolves to
//! the opaque flag token `flag:allow_fraction` that numeric sanitizers read
//! through [`FilterFlags`]. Lookup is total: unknown tokens come back as-is.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

/// Prefix carried by every flag token produced by the table.
pub const FLAG_PREFIX: &str = "flag:";

static RULE_SYNONYMS: &[(&str, &str)] = &[
    ("alphabet", "alphabetic"),
    ("bool", "boolean"),
    ("fileext", "fileextension"),
    ("int", "integer"),
    ("num", "numeric"),
    ("number", "numeric"),
    ("str", "string"),
];

static FLAG_SYNONYMS: &[&str] = &[
    "allow_fraction",
    "allow_hex",
    "allow_octal",
    "allow_scientific",
    "allow_thousand",
    "encode_amp",
    "encode_high",
    "encode_low",
    "host_required",
    "ipv4",
    "ipv6",
    "no_encode_quotes",
    "no_priv_range",
    "no_res_range",
    "null_on_failure",
    "path_required",
    "query_required",
    "scheme_required",
    "strip_backtick",
    "strip_high",
    "strip_low",
];

static SYNONYMS: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, String> = RULE_SYNONYMS
        .iter()
        .map(|(alias, canonical)| (*alias, canonical.to_string()))
        .collect();
    table.extend(
        FLAG_SYNONYMS
            .iter()
            .map(|flag| (*flag, format!("{FLAG_PREFIX}{flag}"))),
    );
    table
});

/// Resolves a rule name or argument token through the synonym table.
///
/// The lookup is case-insensitive; a token without an entry is returned unchanged.
pub fn resolve(token: &str) -> Cow<'_, str> {
    match SYNONYMS.get(token.to_lowercase().as_str()) {
        Some(mapped) => Cow::Owned(mapped.clone()),
        None => Cow::Borrowed(token),
    }
}

/// Resolves every argument of a rule through the synonym table.
pub fn resolve_all(arguments: &[String]) -> Vec<String> {
    arguments.iter().map(|arg| resolve(arg).into_owned()).collect()
}

/// Flags understood by the built-in sanitizers and validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterFlags {
    pub allow_fraction: bool,
    pub allow_thousand: bool,
    pub allow_scientific: bool,
    pub allow_hex: bool,
    pub ipv4: bool,
    pub ipv6: bool,
    pub no_priv_range: bool,
    pub no_res_range: bool,
    pub encode_amp: bool,
    pub strip_low: bool,
    pub strip_high: bool,
    pub strip_backtick: bool,
    pub scheme_required: bool,
    pub host_required: bool,
    pub path_required: bool,
    pub query_required: bool,
}

impl FilterFlags {
    /// Collects the flags among already-resolved arguments; other arguments are ignored.
    pub fn from_args(arguments: &[String]) -> Self {
        let mut flags = Self::default();
        for flag in arguments.iter().filter_map(|a| a.strip_prefix(FLAG_PREFIX)) {
            match flag {
                "allow_fraction" => flags.allow_fraction = true,
                "allow_thousand" => flags.allow_thousand = true,
                "allow_scientific" => flags.allow_scientific = true,
                "allow_hex" => flags.allow_hex = true,
                "ipv4" => flags.ipv4 = true,
                "ipv6" => flags.ipv6 = true,
                "no_priv_range" => flags.no_priv_range = true,
                "no_res_range" => flags.no_res_range = true,
                "encode_amp" => flags.encode_amp = true,
                "strip_low" => flags.strip_low = true,
                "strip_high" => flags.strip_high = true,
                "strip_backtick" => flags.strip_backtick = true,
                "scheme_required" => flags.scheme_required = true,
                "host_required" => flags.host_required = true,
                "path_required" => flags.path_required = true,
                "query_required" => flags.query_required = true,
                _ => {}
            }
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_rule_aliases() {
        assert_eq!(resolve("int"), "integer");
        assert_eq!(resolve("BOOL"), "boolean");
        assert_eq!(resolve("fileext"), "fileextension");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert!(matches!(resolve("Trim"), Cow::Borrowed("Trim")));
        assert_eq!(resolve("5"), "5");
    }

    #[test]
    fn flag_tokens_feed_filter_flags() {
        let args = resolve_all(&["allow_fraction".to_string(), "3".to_string()]);
        assert_eq!(args, vec!["flag:allow_fraction".to_string(), "3".to_string()]);

        let flags = FilterFlags::from_args(&args);
        assert!(flags.allow_fraction);
        assert!(!flags.allow_thousand);
    }
}
