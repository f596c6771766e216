// File: fieldsieve-core/src/validators.rs
//! Built-in validation predicates.
//!
//! Each predicate has the [`ValidateFn`](crate::registry::ValidateFn) signature:
//! it receives the field name, the whole (sanitized) record and the
//! synonym-resolved rule arguments, and answers whether the field passes.
//!
//! The engine never calls a predicate other than `required`/`requiredfile`
//! for an absent or blank field, so the predicates below may assume a value
//! is present. They still answer `true` for a missing value so that they are
//! safe to call directly.
//!
//! License: MIT OR APACHE 2.0

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::warn;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

use crate::synonyms::FilterFlags;
use crate::Record;

static ALPHABETIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("valid regex"));
static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("valid regex")
});
static GUID_V4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{?[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\}?$")
        .expect("valid regex")
});
static IBAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2}\d{2} ?[A-Z\d]{4}( ?\d{4})+ ?\d{1,4}$").expect("valid regex")
});
static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").expect("valid regex"));
static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("valid regex")
});
static PERSON_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid regex"));
static PHONE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d[\s-]?)?[\(\[\s-]{0,2}?\d{3}[\)\]\s-]{0,2}?\d{3}[\s-]?\d{4}$")
        .expect("valid regex")
});

/// Returns the field value as text, for strings and numbers.
fn text<'a>(field: &str, input: &'a Record) -> Option<Cow<'a, str>> {
    match input.get(field)? {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Runs `check` on the textual value; a missing value passes and a
/// non-textual value fails.
fn check_text(field: &str, input: &Record, check: impl FnOnce(&str) -> bool) -> bool {
    match input.get(field) {
        None | Some(Value::Null) => true,
        Some(_) => text(field, input).is_some_and(|s| check(&s)),
    }
}

fn first_arg_as<T: std::str::FromStr>(args: &[String]) -> Option<T> {
    args.first().and_then(|a| a.trim().parse::<T>().ok())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn parse_number(value: &str) -> Option<f64> {
    if NUMERIC.is_match(value) {
        value.trim().parse::<f64>().ok()
    } else {
        None
    }
}

pub fn alphabetic(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| ALPHABETIC.is_match(s))
}

pub fn alphanumeric(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| ALPHANUMERIC.is_match(s))
}

/// Accepts JSON booleans and the usual boolean spellings (`true`, `off`, `1`, ...).
pub fn boolean(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        None | Some(Value::Null) | Some(Value::Bool(_)) => true,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n == 0 || n == 1),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "false" | "1" | "0" | "yes" | "no" | "on" | "off"
        ),
        Some(_) => false,
    }
}

/// Luhn checksum over the digits [`credit_card`] keeps from the input.
/// A non-digit anywhere fails the check.
pub fn is_valid_luhn(digits: &str) -> bool {
    let sum = digits
        .chars()
        .rev()
        .enumerate()
        .try_fold(0u32, |sum, (position, c)| {
            let digit = c.to_digit(10)?;
            let weighted = if position % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            };
            Some(sum + weighted)
        });
    sum.is_some_and(|sum| sum % 10 == 0)
}

/// Strips non-digits and applies the Luhn check. Nothing left after the
/// cleanup counts as an empty value and passes.
pub fn credit_card(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        digits.is_empty() || is_valid_luhn(&digits)
    })
}

/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`.
pub fn date(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| parse_date(s).is_some())
}

pub fn email(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| EMAIL.is_match(s))
}

/// `endswith:suffix[,caseinsensitive]`
pub fn ends_with(field: &str, input: &Record, args: &[String]) -> bool {
    check_text(field, input, |s| match args.first() {
        None => true,
        Some(suffix) if args.get(1).is_some_and(|a| a == "caseinsensitive") => {
            s.to_lowercase().ends_with(&suffix.to_lowercase())
        }
        Some(suffix) => s.ends_with(suffix.as_str()),
    })
}

/// `equalsfield:other` compares the textual forms of both fields.
pub fn equals_field(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(other) = args.first() else { return false };
    match (input.get(field), input.get(other.as_str())) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(a), Some(b)) => a == b || display(a) == display(b),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn exact_len(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(len) = first_arg_as::<usize>(args) else { return false };
    check_text(field, input, |s| s.chars().count() == len)
}

/// Checks an uploaded-file descriptor (`{"name": ..., "error": ...}`) against
/// the allowed extensions. A descriptor reporting error 4 (no file) passes.
pub fn file_extension(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(Value::Object(file)) = input.get(field) else {
        return input.get(field).is_none();
    };
    if file.get("error").and_then(Value::as_i64) == Some(4) {
        return true;
    }
    let Some(name) = file.get("name").and_then(Value::as_str) else { return false };
    match name.rsplit_once('.') {
        Some((_, ext)) => args.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

pub fn float(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        Some(Value::Number(_)) => true,
        _ => check_text(field, input, |s| parse_number(s).is_some_and(f64::is_finite)),
    }
}

pub fn guid_v4(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| GUID_V4.is_match(s))
}

/// IBAN structure check followed by the ISO 7064 mod-97 checksum.
pub fn iban(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| {
        if !IBAN.is_match(s) {
            return false;
        }
        let compact: String = s.chars().filter(|c| *c != ' ').collect();
        let rearranged = format!("{}{}", &compact[4..], &compact[..4]);
        let mut remainder: u32 = 0;
        for c in rearranged.chars() {
            let Some(value) = c.to_digit(36) else { return false };
            let step = if value >= 10 { 100 } else { 10 };
            remainder = (remainder * step + value) % 97;
        }
        remainder == 1
    })
}

/// The trimmed, lower-cased value must equal one of the arguments.
pub fn in_list(field: &str, input: &Record, args: &[String]) -> bool {
    check_text(field, input, |s| {
        let needle = s.trim().to_lowercase();
        args.iter().any(|a| *a == needle)
    })
}

pub fn integer(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        Some(Value::Number(n)) => n.is_i64() || n.is_u64(),
        _ => check_text(field, input, |s| {
            let s = s.trim();
            INTEGER.is_match(s) && s.parse::<i64>().is_ok()
        }),
    }
}

fn ipv4_allowed(ip: &Ipv4Addr, flags: &FilterFlags) -> bool {
    if flags.no_priv_range && ip.is_private() {
        return false;
    }
    if flags.no_res_range
        && (ip.is_unspecified() || ip.is_loopback() || ip.is_link_local() || ip.is_broadcast())
    {
        return false;
    }
    true
}

fn ipv6_allowed(ip: &Ipv6Addr, flags: &FilterFlags) -> bool {
    if flags.no_priv_range && (ip.segments()[0] & 0xfe00) == 0xfc00 {
        return false;
    }
    if flags.no_res_range && (ip.is_unspecified() || ip.is_loopback()) {
        return false;
    }
    true
}

/// Accepts IPv4 or IPv6; the `ipv4`, `ipv6`, `no_priv_range` and
/// `no_res_range` flags narrow the accepted set.
pub fn ip(field: &str, input: &Record, args: &[String]) -> bool {
    let flags = FilterFlags::from_args(args);
    check_text(field, input, |s| match s.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => (!flags.ipv6 || flags.ipv4) && ipv4_allowed(&v4, &flags),
        Ok(IpAddr::V6(v6)) => (!flags.ipv4 || flags.ipv6) && ipv6_allowed(&v6, &flags),
        Err(_) => false,
    })
}

pub fn ipv4(field: &str, input: &Record, args: &[String]) -> bool {
    let flags = FilterFlags::from_args(args);
    check_text(field, input, |s| {
        s.trim()
            .parse::<Ipv4Addr>()
            .is_ok_and(|v4| ipv4_allowed(&v4, &flags))
    })
}

pub fn ipv6(field: &str, input: &Record, args: &[String]) -> bool {
    let flags = FilterFlags::from_args(args);
    check_text(field, input, |s| {
        s.trim()
            .parse::<Ipv6Addr>()
            .is_ok_and(|v6| ipv6_allowed(&v6, &flags))
    })
}

/// The value must be a string holding a JSON object.
pub fn json_string(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => serde_json::from_str::<Value>(s).is_ok_and(|v| v.is_object()),
        Some(_) => false,
    }
}

pub fn max_len(field: &str, input: &Record, args: &[String]) -> bool {
    let max = first_arg_as::<usize>(args).unwrap_or(0);
    check_text(field, input, |s| s.chars().count() <= max)
}

pub fn min_len(field: &str, input: &Record, args: &[String]) -> bool {
    let min = first_arg_as::<usize>(args).unwrap_or(0);
    check_text(field, input, |s| s.chars().count() >= min)
}

pub fn max_numeric(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(limit) = args.first().and_then(|a| parse_number(a)) else { return false };
    check_text(field, input, |s| parse_number(s).is_some_and(|n| n <= limit))
}

pub fn min_numeric(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(limit) = args.first().and_then(|a| parse_number(a)) else { return false };
    check_text(field, input, |s| parse_number(s).is_some_and(|n| n >= limit))
}

/// `minage:N` - the date in the field lies at least N whole years in the past.
pub fn min_age(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(years) = first_arg_as::<u32>(args) else { return false };
    let today = Local::now().date_naive();
    check_text(field, input, |s| {
        parse_date(s)
            .and_then(|born| today.years_since(born))
            .is_some_and(|age| age >= years)
    })
}

pub fn not_in_list(field: &str, input: &Record, args: &[String]) -> bool {
    check_text(field, input, |s| {
        let needle = s.trim().to_lowercase();
        !args.iter().any(|a| *a == needle)
    })
}

pub fn numeric(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        Some(Value::Number(_)) => true,
        _ => check_text(field, input, |s| NUMERIC.is_match(s)),
    }
}

pub fn person_name(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| PERSON_NAME.is_match(s))
}

/// North-American style numbers: `555-555-5555`, `1 (519) 555-4422`, ...
pub fn phone_number(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| PHONE_NUMBER.is_match(s))
}

/// Compiles a `/pattern/flags` (or bare pattern) argument.
fn compile_user_regex(raw: &str) -> Option<Regex> {
    let (pattern, flags) = match raw.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
        Some((pattern, flags)) => (pattern, flags),
        None => (raw, ""),
    };
    let built = RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build();
    match built {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Rule argument '{}' is not a valid regular expression: {}", raw, e);
            None
        }
    }
}

pub fn regex(field: &str, input: &Record, args: &[String]) -> bool {
    let Some(regex) = args.first().and_then(|a| compile_user_regex(a)) else { return false };
    check_text(field, input, |s| regex.is_match(s))
}

/// Passes when the field is present and either non-blank or one of the
/// falsy-but-present values `false`, `0`, `0.0` and `"0"`.
pub fn required(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(_)) | Some(Value::Number(_)) => true,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Passes when the field holds an uploaded-file descriptor that does not
/// report error 4 (no file uploaded).
pub fn required_file(field: &str, input: &Record, _args: &[String]) -> bool {
    match input.get(field) {
        Some(Value::Object(file)) => match file.get("error").and_then(Value::as_i64) {
            Some(code) => code != 4,
            None => file
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| !name.is_empty()),
        },
        _ => false,
    }
}

/// `startswith:prefix[,caseinsensitive]`
pub fn starts_with(field: &str, input: &Record, args: &[String]) -> bool {
    check_text(field, input, |s| match args.first() {
        None => true,
        Some(prefix) if args.get(1).is_some_and(|a| a == "caseinsensitive") => {
            s.to_lowercase().starts_with(&prefix.to_lowercase())
        }
        Some(prefix) => s.starts_with(prefix.as_str()),
    })
}

/// Weak detection: at least one letter, one digit and one space.
pub fn street_address(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| {
        s.chars().any(|c| c.is_ascii_alphabetic())
            && s.chars().any(|c| c.is_ascii_digit())
            && s.chars().any(char::is_whitespace)
    })
}

/// The `path_required` and `query_required` flags add extra constraints.
pub fn url(field: &str, input: &Record, args: &[String]) -> bool {
    let flags = FilterFlags::from_args(args);
    check_text(field, input, |s| match url::Url::parse(s.trim()) {
        Ok(parsed) => {
            (!flags.host_required || parsed.host().is_some())
                && (!flags.path_required || parsed.path().len() > 1)
                && (!flags.query_required || parsed.query().is_some())
        }
        Err(_) => false,
    })
}

/// Resolves the host of the URL through DNS. This blocks and has no timeout.
pub fn url_exists(field: &str, input: &Record, _args: &[String]) -> bool {
    check_text(field, input, |s| {
        let lowered = s.trim().to_lowercase();
        let host = url::Url::parse(&lowered)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or(lowered);
        (host.as_str(), 80)
            .to_socket_addrs()
            .is_ok_and(|mut addrs| addrs.next().is_some())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        let mut input = Record::new();
        input.insert("f".to_string(), value);
        input
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn luhn_checks() {
        assert!(is_valid_luhn("4539578763621486"));
        assert!(!is_valid_luhn("4539578763621487"));
        assert!(is_valid_luhn("79927398713"));
        assert!(!is_valid_luhn("7992-7398713"));
        assert!(credit_card("f", &record(json!("4539 5787 6362 1486")), &[]));
        assert!(credit_card("f", &record(json!("----")), &[]));
    }

    #[test]
    fn integer_rejects_text() {
        assert!(integer("f", &record(json!("42")), &[]));
        assert!(integer("f", &record(json!(-3)), &[]));
        assert!(!integer("f", &record(json!("abc")), &[]));
        assert!(!integer("f", &record(json!("012")), &[]));
        assert!(!integer("f", &record(json!(1.5)), &[]));
    }

    #[test]
    fn required_accepts_falsy_but_present_values() {
        assert!(required("f", &record(json!(0)), &[]));
        assert!(required("f", &record(json!(false)), &[]));
        assert!(required("f", &record(json!("0")), &[]));
        assert!(!required("f", &record(json!("  ")), &[]));
        assert!(!required("missing", &record(json!("x")), &[]));
    }

    #[test]
    fn iban_checksum() {
        assert!(iban("f", &record(json!("GB82 WEST 1234 5698 7654 32")), &[]));
        assert!(!iban("f", &record(json!("GB82 WEST 1234 5698 7654 33")), &[]));
    }

    #[test]
    fn list_membership() {
        let list = args(&["red", "green"]);
        assert!(in_list("f", &record(json!(" Red ")), &list));
        assert!(!in_list("f", &record(json!("blue")), &list));
        assert!(not_in_list("f", &record(json!("blue")), &list));
    }

    #[test]
    fn lengths_count_characters() {
        assert!(min_len("f", &record(json!("héllo")), &args(&["5"])));
        assert!(max_len("f", &record(json!("héllo")), &args(&["5"])));
        assert!(exact_len("f", &record(json!("héllo")), &args(&["5"])));
        assert!(!exact_len("f", &record(json!("héllo")), &args(&["4"])));
    }

    #[test]
    fn numeric_bounds() {
        assert!(min_numeric("f", &record(json!("10")), &args(&["5"])));
        assert!(!max_numeric("f", &record(json!("10")), &args(&["5"])));
        assert!(!min_numeric("f", &record(json!("ten")), &args(&["5"])));
    }

    #[test]
    fn dates_and_ages() {
        assert!(date("f", &record(json!("2020-02-29")), &[]));
        assert!(date("f", &record(json!("2020-02-29 13:45:00")), &[]));
        assert!(!date("f", &record(json!("2021-02-29")), &[]));
        assert!(min_age("f", &record(json!("1970-01-01")), &args(&["18"])));
        assert!(!min_age("f", &record(json!("2999-01-01")), &args(&["18"])));
    }

    #[test]
    fn user_regex_supports_delimiters_and_flags() {
        assert!(regex("f", &record(json!("ABC")), &args(&["/^[a-z]+$/i"])));
        assert!(!regex("f", &record(json!("ABC")), &args(&["/^[a-z]+$/"])));
        assert!(!regex("f", &record(json!("ABC")), &args(&["/([/"])));
    }

    #[test]
    fn network_shapes() {
        assert!(ip("f", &record(json!("10.0.0.1")), &[]));
        assert!(!ip("f", &record(json!("10.0.0.1")), &args(&["flag:no_priv_range"])));
        assert!(ipv6("f", &record(json!("::1")), &[]));
        assert!(!ipv4("f", &record(json!("::1")), &[]));
        assert!(url("f", &record(json!("https://example.com/a?b=c")), &[]));
        assert!(!url("f", &record(json!("not a url")), &[]));
    }

    #[test]
    fn file_descriptors() {
        let upload = json!({"name": "photo.JPG", "error": 0});
        assert!(file_extension("f", &record(upload.clone()), &args(&["jpg", "png"])));
        assert!(!file_extension("f", &record(upload.clone()), &args(&["gif"])));
        assert!(required_file("f", &record(upload), &[]));
        assert!(!required_file("f", &record(json!({"name": "", "error": 4})), &[]));
    }

    #[test]
    fn misc_shapes() {
        assert!(email("f", &record(json!("Foo@Bar.com")), &[]));
        assert!(!email("f", &record(json!("foo@")), &[]));
        assert!(json_string("f", &record(json!("{\"a\":1}")), &[]));
        assert!(!json_string("f", &record(json!("[1]")), &[]));
        assert!(guid_v4("f", &record(json!("{0b3e4a5c-1d2f-4a6b-8c7d-9e0f1a2b3c4d}")), &[]));
        assert!(phone_number("f", &record(json!("1 (519) 555-4422")), &[]));
        assert!(street_address("f", &record(json!("221B Baker Street")), &[]));
        assert!(starts_with("f", &record(json!("Hello")), &args(&["he", "caseinsensitive"])));
        assert!(!ends_with("f", &record(json!("Hello")), &args(&["LO"])));
    }
}
