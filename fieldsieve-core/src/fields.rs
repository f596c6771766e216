//! fields.rs - Per-field configuration: label plus ordered rule lists.
//!
//! License: MIT OR APACHE 2.0

use serde::Serialize;

use crate::grammar::RuleDescriptor;

/// Where newly parsed rules go relative to the ones already configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePosition {
    #[default]
    Append,
    Prepend,
}

impl From<bool> for MergePosition {
    /// `true` means "merge before", i.e. prepend.
    fn from(merge_before: bool) -> Self {
        if merge_before {
            MergePosition::Prepend
        } else {
            MergePosition::Append
        }
    }
}

/// Label and rules for one field. Rule order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRuleSet {
    label: String,
    sanitizations: Vec<RuleDescriptor>,
    validations: Vec<RuleDescriptor>,
}

impl FieldRuleSet {
    /// Creates an empty rule set labelled with the humanized field id.
    pub fn new(field_id: &str) -> Self {
        Self {
            label: humanize_label(field_id),
            sanitizations: Vec::new(),
            validations: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn sanitizations(&self) -> &[RuleDescriptor] {
        &self.sanitizations
    }

    pub fn validations(&self) -> &[RuleDescriptor] {
        &self.validations
    }

    pub fn merge_sanitizations(&mut self, rules: Vec<RuleDescriptor>, position: MergePosition) {
        merge(&mut self.sanitizations, rules, position);
    }

    pub fn merge_validations(&mut self, rules: Vec<RuleDescriptor>, position: MergePosition) {
        merge(&mut self.validations, rules, position);
    }

    /// Empties the sanitization list; the label stays.
    pub fn clear_sanitizations(&mut self) {
        self.sanitizations.clear();
    }

    /// Empties the validation list; the label stays.
    pub fn clear_validations(&mut self) {
        self.validations.clear();
    }

    /// True when at least one sanitization or validation rule is configured.
    pub fn has_rules(&self) -> bool {
        !self.sanitizations.is_empty() || !self.validations.is_empty()
    }
}

fn merge(existing: &mut Vec<RuleDescriptor>, mut rules: Vec<RuleDescriptor>, position: MergePosition) {
    match position {
        MergePosition::Append => existing.append(&mut rules),
        MergePosition::Prepend => {
            rules.append(existing);
            *existing = rules;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Separator,
    Upper,
    Lower,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() || c == '_' || c == '-' {
        CharClass::Separator
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_lowercase() {
        CharClass::Lower
    } else {
        CharClass::Other
    }
}

/// Turns a developer-facing identifier into a display label.
///
/// Snake, kebab, camel and train case all collapse into capitalized words:
/// `first_name` becomes `First Name`, `HTTPServer` becomes `HTTP Server`,
/// `field1` becomes `Field 1`.
pub fn humanize_label(field_id: &str) -> String {
    let chars: Vec<char> = field_id.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        match classify(chars[i]) {
            CharClass::Separator => {
                i += 1;
                continue;
            }
            CharClass::Upper => {
                while i < chars.len() && classify(chars[i]) == CharClass::Upper {
                    i += 1;
                }
                let next_is_lower = i < chars.len() && classify(chars[i]) == CharClass::Lower;
                if i - start == 1 {
                    while i < chars.len() && classify(chars[i]) == CharClass::Lower {
                        i += 1;
                    }
                } else if next_is_lower {
                    // The last capital starts the next word: `HTTPServer`.
                    i -= 1;
                }
            }
            class => {
                while i < chars.len() && classify(chars[i]) == class {
                    i += 1;
                }
            }
        }
        words.push(capitalize(&chars[start..i]));
    }

    words.join(" ")
}

fn capitalize(word: &[char]) -> String {
    match word.split_first() {
        Some((first, rest)) => first.to_uppercase().chain(rest.iter().copied()).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RuleKind;
    use crate::grammar::parse_rules;

    #[test]
    fn humanizes_common_identifier_styles() {
        assert_eq!(humanize_label("first_name"), "First Name");
        assert_eq!(humanize_label("firstName"), "First Name");
        assert_eq!(humanize_label("Content-Type"), "Content Type");
        assert_eq!(humanize_label("HTTPServer"), "HTTP Server");
        assert_eq!(humanize_label("userID"), "User ID");
        assert_eq!(humanize_label("field1"), "Field 1");
        assert_eq!(humanize_label("  __email__ "), "Email");
        assert_eq!(humanize_label(""), "");
    }

    #[test]
    fn merge_respects_position() {
        let mut set = FieldRuleSet::new("name");
        set.merge_sanitizations(parse_rules("trim", RuleKind::Sanitization).unwrap(), MergePosition::Append);
        set.merge_sanitizations(parse_rules("string", RuleKind::Sanitization).unwrap(), MergePosition::Append);
        set.merge_sanitizations(parse_rules("default:x", RuleKind::Sanitization).unwrap(), true.into());

        let names: Vec<&str> = set.sanitizations().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["default", "trim", "string"]);
    }

    #[test]
    fn clearing_keeps_the_label() {
        let mut set = FieldRuleSet::new("zip_code");
        set.set_label("Postcode");
        set.merge_validations(parse_rules("required", RuleKind::Validation).unwrap(), MergePosition::Append);
        assert!(set.has_rules());

        set.clear_validations();
        assert!(!set.has_rules());
        assert_eq!(set.label(), "Postcode");
    }
}
