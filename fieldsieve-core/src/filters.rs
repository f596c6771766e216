// File: fieldsieve-core/src/filters.rs
//! Built-in sanitization filters.
//!
//! Every filter is a plain function with the [`SanitizeFn`](crate::registry::SanitizeFn)
//! signature: it receives one leaf value plus the synonym-resolved arguments of
//! the rule and returns the replacement value. String filters leave numbers,
//! booleans and null untouched; `default` and `integer` are the exceptions.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use crate::synonyms::FilterFlags;

/// Tags kept by `basichtmltags`.
static BASIC_HTML_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend([
        "a", "b", "blockquote", "br", "code", "dd", "dl", "em", "hr", "h1", "h2", "h3", "h4",
        "h5", "h6", "i", "img", "label", "li", "p", "span", "strong", "sub", "sup", "ul",
    ]);
    set
});

static NOISE_WORDS: &[&str] = &[
    "about", "after", "all", "also", "an", "and", "another", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "between", "both", "but", "by", "came", "can",
    "come", "could", "did", "do", "each", "for", "from", "get", "got", "has", "had", "he",
    "have", "her", "here", "him", "himself", "his", "how", "if", "in", "into", "is", "it",
    "its", "it's", "like", "make", "many", "me", "might", "more", "most", "much", "must", "my",
    "never", "now", "of", "on", "only", "or", "other", "our", "out", "over", "said", "same",
    "see", "should", "since", "some", "still", "such", "take", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "up", "very", "was", "way", "we", "well", "were", "what", "where", "which", "while", "who",
    "with", "would", "you", "your", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l",
    "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "$", "1", "2", "3",
    "4", "5", "6", "7", "8", "9", "0", "_",
];

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").expect("valid tag regex")
});

static PUNCTUATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{P}").expect("valid punctuation regex"));

static MULTI_SPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\s+").expect("valid whitespace regex"));

fn map_string(value: &Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    }
}

/// Removes every HTML tag whose name is not accepted by `keep`.
pub(crate) fn strip_tags_except(input: &str, keep: impl Fn(&str) -> bool) -> String {
    TAG_REGEX
        .replace_all(input, |caps: &regex::Captures| match caps.get(1) {
            Some(tag) if keep(&tag.as_str().to_lowercase()) => caps[0].to_string(),
            _ => String::new(),
        })
        .into_owned()
}

/// Removes all HTML tags.
pub(crate) fn strip_tags(input: &str) -> String {
    strip_tags_except(input, |_| false)
}

/// Strips every HTML tag except a small set of basic formatting tags.
pub fn basic_html_tags(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| strip_tags_except(s, |tag| BASIC_HTML_TAGS.contains(tag)))
}

/// Replaces a null or blank value with the first argument.
pub fn default_value(value: &Value, args: &[String]) -> Value {
    let blank = match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    match args.first() {
        Some(fallback) if blank => Value::String(fallback.clone()),
        _ => value.clone(),
    }
}

/// Removes characters that cannot appear in an e-mail address.
pub fn email(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(*c))
            .collect()
    })
}

/// Keeps digits and signs, plus the separators allowed by the flag arguments.
///
/// The decimal point is always kept; `allow_thousand` keeps `,` and
/// `allow_scientific` keeps `e`/`E`.
pub fn float(value: &Value, args: &[String]) -> Value {
    let flags = FilterFlags::from_args(args);
    map_string(value, |s| {
        s.chars()
            .filter(|c| {
                c.is_ascii_digit()
                    || *c == '+'
                    || *c == '-'
                    || *c == '.'
                    || (flags.allow_thousand && *c == ',')
                    || (flags.allow_scientific && (*c == 'e' || *c == 'E'))
            })
            .collect()
    })
}

/// Encodes quotes, `<`, `>`, `&` and ASCII control characters as numeric HTML entities.
pub fn html_encode(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '"' | '\'' | '<' | '>' | '&' => out.push_str(&format!("&#{};", c as u32)),
                c if (c as u32) < 32 => out.push_str(&format!("&#{};", c as u32)),
                c => out.push(c),
            }
        }
        out
    })
}

/// Casts the value to an integer.
///
/// Strings contribute their leading integer (`" 42abc"` becomes `42`),
/// floats are truncated, booleans become `1`/`0`, and anything else becomes `0`.
pub fn integer(value: &Value, _args: &[String]) -> Value {
    let n: i64 = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => leading_integer(s),
        _ => 0,
    };
    Value::from(n)
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].parse::<i64>().unwrap_or(0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Removes common English noise words.
pub fn noise_words(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        let mut text = format!(" {} ", MULTI_SPACE_REGEX.replace_all(s, " "));
        for word in NOISE_WORDS {
            let needle = format!(" {word} ");
            loop {
                let lower = text.to_lowercase();
                // Lower-casing can shift byte offsets for non-ASCII text; only
                // splice when the offsets still line up.
                match lower.find(&needle) {
                    Some(pos) if lower.len() == text.len() => {
                        text.replace_range(pos..pos + needle.len(), " ");
                    }
                    _ => break,
                }
            }
        }
        text.trim().to_string()
    })
}

/// Removes punctuation, keeping `. = $ ' % -`.
pub fn no_punctuation(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        PUNCTUATION_REGEX
            .replace_all(s, |caps: &regex::Captures| {
                let m = &caps[0];
                if ".=$'%-".contains(m) {
                    m.to_string()
                } else {
                    String::new()
                }
            })
            .into_owned()
    })
}

/// Keeps digits and signs only.
pub fn number(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        s.chars()
            .filter(|c| c.is_ascii_digit() || *c == '+' || *c == '-')
            .collect()
    })
}

/// Strips tags and encodes quotes.
pub fn string(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        strip_tags(s).replace('"', "&#34;").replace('\'', "&#39;")
    })
}

/// Trims whitespace, or the characters given as arguments.
pub fn trim(value: &Value, args: &[String]) -> Value {
    map_string(value, |s| {
        if args.is_empty() {
            s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
                .to_string()
        } else {
            let set: String = args.concat();
            s.trim_matches(|c: char| set.contains(c)).to_string()
        }
    })
}

/// Percent-encodes everything outside `A-Z a-z 0-9 - . _`.
///
/// Existing `%XX` escapes are left alone so the filter is idempotent.
pub fn url_encode(value: &Value, _args: &[String]) -> Value {
    map_string(value, |s| {
        let bytes = s.as_bytes();
        let mut out = String::with_capacity(s.len());
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let is_escape = b == b'%'
                && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_') || is_escape {
                out.push(b as char);
            } else {
                out.push_str(&format!("%{b:02X}"));
            }
            i += 1;
        }
        out
    })
}
