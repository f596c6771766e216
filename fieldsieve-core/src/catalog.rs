//! catalog.rs - Error message templates and their rendering.
//!
//! Templates use `{field}`, `{filter}`, `{args}`, `{argN}` (1-based) and
//! `{value}` placeholders. Rendering is one left-to-right pass over the
//! template, so text substituted for one placeholder is never scanned again:
//! a label or value that itself contains `{value}` comes out literally.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::synonyms;

pub const DEFAULT: &str = "{field} is invalid";
pub const DEFAULT_LONG: &str = "Field {field} with value '{value}' failed validation {filter}";
pub const INEXISTENT_VALIDATION: &str =
    "Validation filter {filter} does not exist for {field}, please contact the application owner";
pub const MISMATCH: &str = "There is no validation rule for {field}";

/// Placeholder shown for absent or blank values.
pub const EMPTY_VALUE: &str = "empty";

static DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("default", DEFAULT),
    ("default_long", DEFAULT_LONG),
    ("inexistent_validation", INEXISTENT_VALIDATION),
    ("mismatch", MISMATCH),
    ("alphabetic", "{field} may only contain alphabetic characters"),
    ("alphanumeric", "{field} may only contain alpha-numeric characters"),
    ("boolean", "{field} field may only contain a true or false value"),
    ("creditcard", "{field} does not contain a valid credit card number"),
    ("date", "{field} is not a valid date"),
    ("email", "{field} is not a valid email address"),
    ("endswith", "{field} does not end with {arg1}"),
    ("equalsfield", "{field} does not equal {arg1}"),
    ("exactlen", "{field} must be exactly {arg1} characters long"),
    ("fileextension", "{field} does not have a valid file extension"),
    ("float", "{field} may only contain a float value"),
    ("guidv4", "{field} is not a valid GUID (v4)"),
    ("iban", "{field} is not a valid IBAN"),
    ("inlist", "{field} must be one of these values: {args}"),
    ("integer", "{field} may only contain an integer value"),
    ("ip", "{field} does not contain a valid IP address"),
    ("ipv4", "{field} does not contain a valid IPv4 address"),
    ("ipv6", "{field} does not contain a valid IPv6 address"),
    ("jsonstring", "{field} is not a JSON-encoded string"),
    ("maxlen", "{field} must be {arg1} or shorter in length"),
    ("maxnumeric", "{field} must be a numeric value, equal to or lower than {arg1}"),
    ("minage", "The {field} field needs to have an age greater than or equal to {arg1}"),
    ("minlen", "{field} must be {arg1} or longer in length"),
    ("minnumeric", "The {field} field needs to be a numeric value, equal to, or higher than {arg1}"),
    ("notinlist", "{field} cannot be one of these values: {args}"),
    ("numeric", "{field} may only contain numeric characters"),
    ("personname", "{field} does not seem to contain a person's name"),
    ("phonenumber", "{field} does not seem to contain a valid phone number"),
    ("regex", "{field} did not match regular expression: {arg1}"),
    ("required", "{field} is required"),
    ("requiredfile", "File is required for {field}"),
    ("startswith", "{field} does not start with {arg1}"),
    ("streetaddress", "{field} does not seem to be a valid street address"),
    ("url", "The {field} field is required to be a valid URL"),
    ("urlexists", "{field} URL does not exist"),
];

static TEMPLATES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DEFAULT_TEMPLATES.iter().copied().collect());

/// Looks up the template for `key`: the exact key, then its synonym, then
/// the long-form default.
pub fn template(key: &str) -> &'static str {
    lookup(key).unwrap_or(DEFAULT_LONG)
}

/// Like [`template`] without the fallback, so callers can tell a known rule
/// from an unknown one.
pub fn lookup(key: &str) -> Option<&'static str> {
    TEMPLATES
        .get(key)
        .or_else(|| TEMPLATES.get(synonyms::resolve(key).as_ref()))
        .copied()
}

/// Expands the placeholders in `template`.
///
/// `value` is the display form of the field value; an empty one renders as
/// `"empty"`. Unknown placeholders, `{argN}` past the end of `arguments` and
/// unbalanced braces are copied through unchanged.
pub fn render(template: &str, label: &str, value: &str, rule_name: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + label.len() + value.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        let Some(close) = candidate.find('}') else {
            rest = candidate;
            break;
        };
        let token = &candidate[1..close];
        match placeholder(token, label, value, rule_name, arguments) {
            Some(replacement) => {
                out.push_str(&replacement);
                rest = &candidate[close + 1..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholder(token: &str, label: &str, value: &str, rule_name: &str, arguments: &[String]) -> Option<String> {
    match token {
        "field" => Some(label.to_string()),
        "filter" => Some(rule_name.to_string()),
        "args" => Some(arguments.join(", ")),
        "value" if value.is_empty() => Some(EMPTY_VALUE.to_string()),
        "value" => Some(value.to_string()),
        _ => {
            let index: usize = token.strip_prefix("arg")?.parse().ok()?;
            index.checked_sub(1).and_then(|i| arguments.get(i)).cloned()
        }
    }
}

/// The fixed human sentence for one error, used by the engine's readable
/// error rendering. `label_markup` is the label already wrapped in markup
/// (or plain, for text output). `rule` is the canonical rule name or
/// `mismatch`.
pub fn readable_sentence(rule: &str, label_markup: &str, arguments: &[String]) -> String {
    let param = arguments.first().map(String::as_str).unwrap_or_default();
    let field = label_markup;
    match rule {
        "mismatch" => format!("There is no validation rule for {field}"),
        "required" | "requiredfile" => format!("The {field} field is required"),
        "email" => format!("The {field} field is required to be a valid email address"),
        "maxlen" => format!("The {field} field needs to be {param} or shorter in length"),
        "minlen" => format!("The {field} field needs to be {param} or longer in length"),
        "exactlen" => format!("The {field} field needs to be exactly {param} characters in length"),
        "numeric" => format!("The {field} field may only contain numeric characters"),
        "integer" => format!("The {field} field may only contain a numeric value"),
        "boolean" => format!("The {field} field may only contain a true or false value"),
        "float" => format!("The {field} field may only contain a float value"),
        "url" => format!("The {field} field is required to be a valid URL"),
        "urlexists" => format!("The {field} URL does not exist"),
        "ip" | "ipv4" | "ipv6" => format!("The {field} field needs to contain a valid IP address"),
        "creditcard" => format!("The {field} field needs to contain a valid credit card number"),
        "personname" => format!("The {field} field needs to contain a valid human name"),
        "inlist" => format!(
            "The {field} field needs to contain one of these values: {}",
            arguments.join(", ")
        ),
        "notinlist" => format!("The {field} field contains a value that is not accepted"),
        "streetaddress" => format!("The {field} field needs to be a valid street address"),
        "date" => format!("The {field} field needs to be a valid date"),
        "minnumeric" => {
            format!("The {field} field needs to be a numeric value, equal to, or higher than {param}")
        }
        "maxnumeric" => {
            format!("The {field} field needs to be a numeric value, equal to, or lower than {param}")
        }
        "startswith" => format!("The {field} field needs to start with {param}"),
        "endswith" => format!("The {field} field needs to end with {param}"),
        "fileextension" => format!(
            "The {field} field can have the following extensions {}",
            arguments.join(", ")
        ),
        "equalsfield" => format!("The {field} field does not equal {param} field"),
        "minage" => format!("The {field} field needs to have an age greater than or equal to {param}"),
        _ => format!("The {field} field is invalid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn template_falls_back_through_synonyms() {
        assert_eq!(template("required"), "{field} is required");
        assert_eq!(template("int"), template("integer"));
        assert_eq!(template("no_such_rule"), DEFAULT_LONG);
        assert!(lookup("no_such_rule").is_none());
    }

    #[test]
    fn renders_every_placeholder() {
        let out = render(
            "{field}/{filter}/{args}/{arg2}/{value}",
            "Colour",
            "teal",
            "inlist",
            &args(&["red", "green"]),
        );
        assert_eq!(out, "Colour/inlist/red, green/green/teal");
    }

    #[test]
    fn empty_value_renders_placeholder_text() {
        assert_eq!(
            render(DEFAULT_LONG, "Age", "", "integer", &[]),
            "Field Age with value 'empty' failed validation integer"
        );
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let out = render("{field} got {value}", "{value}", "{arg1}", "x", &args(&["boom"]));
        assert_eq!(out, "{value} got {arg1}");
    }

    #[test]
    fn unknown_placeholders_stay_verbatim() {
        let out = render("{field} {arg3} {nope} {arg0} {", "Name", "v", "x", &args(&["a"]));
        assert_eq!(out, "Name {arg3} {nope} {arg0} {");
    }

    #[test]
    fn readable_sentences_wrap_the_label() {
        let label = r#"<span class="f">Zip</span>"#;
        assert_eq!(
            readable_sentence("minlen", label, &args(&["5"])),
            r#"The <span class="f">Zip</span> field needs to be 5 or longer in length"#
        );
        assert_eq!(readable_sentence("frobnicate", "Zip", &[]), "The Zip field is invalid");
    }
}
