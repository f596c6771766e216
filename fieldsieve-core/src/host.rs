//! host.rs - Plain string transforms reachable as sanitizers by name.
//!
//! These are the last stop in sanitizer resolution: a rule such as `upper`
//! or `strip_tags` that is neither a built-in nor a custom sanitizer runs one
//! of these with the field value as its only input. Non-string values pass
//! through untouched.
//!
//! License: MIT OR APACHE 2.0

use crate::filters::strip_tags;
use crate::registry::HostFn;

pub(crate) static DEFAULT_HOST_FUNCTIONS: &[(&str, HostFn)] = &[
    ("strtolower", lower),
    ("strtoupper", upper),
    ("lower", lower),
    ("upper", upper),
    ("ucfirst", ucfirst),
    ("lcfirst", lcfirst),
    ("ucwords", ucwords),
    ("strrev", reverse),
    ("ltrim", ltrim),
    ("rtrim", rtrim),
    ("nl2br", nl2br),
    ("strip_tags", strip_all_tags),
    ("htmlspecialchars", html_special_chars),
    ("addslashes", add_slashes),
    ("stripslashes", strip_slashes),
];

fn lower(s: &str) -> String {
    s.to_lowercase()
}

fn upper(s: &str) -> String {
    s.to_uppercase()
}

fn map_first(s: &str, f: impl FnOnce(char) -> String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

fn ucfirst(s: &str) -> String {
    map_first(s, |c| c.to_uppercase().collect())
}

fn lcfirst(s: &str) -> String {
    map_first(s, |c| c.to_lowercase().collect())
}

fn ucwords(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

fn reverse(s: &str) -> String {
    s.chars().rev().collect()
}

fn ltrim(s: &str) -> String {
    s.trim_start().to_string()
}

fn rtrim(s: &str) -> String {
    s.trim_end().to_string()
}

fn nl2br(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                out.push_str("<br />\r\n");
            }
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

fn strip_all_tags(s: &str) -> String {
    strip_tags(s)
}

fn html_special_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn add_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

fn strip_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(escaped) => out.push(escaped),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_helpers() {
        assert_eq!(ucfirst("élan vital"), "Élan vital");
        assert_eq!(lcfirst("ABC"), "aBC");
        assert_eq!(ucwords("hello big  world"), "Hello Big  World");
        assert_eq!(ucfirst(""), "");
    }

    #[test]
    fn nl2br_keeps_line_breaks() {
        assert_eq!(nl2br("a\nb\r\nc"), "a<br />\nb<br />\r\nc");
    }

    #[test]
    fn slashes_are_symmetric() {
        let raw = r#"O'Reilly "quoted" \path"#;
        let escaped = add_slashes(raw);
        assert_eq!(escaped, r#"O\'Reilly \"quoted\" \\path"#);
        assert_eq!(strip_slashes(&escaped), raw);
    }

    #[test]
    fn html_special_chars_encodes_markup() {
        assert_eq!(
            html_special_chars(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn table_names_are_lowercase() {
        assert!(DEFAULT_HOST_FUNCTIONS
            .iter()
            .all(|(name, _)| name.chars().all(|c| !c.is_ascii_uppercase())));
        assert_eq!(reverse("abc"), "cba");
        assert_eq!(strip_all_tags("<b>bold</b>"), "bold");
    }
}
