//! Table rendering for the `rules` command.
//! License: MIT OR APACHE 2.0

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use fieldsieve_core::{RuleDescriptor, RuleKind, ValidationEngine};

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold).fg(Color::Cyan)
}

/// Where a rule name resolves in the engine's registry, or `unknown`.
fn resolution(engine: &ValidationEngine, kind: RuleKind, rule: &RuleDescriptor) -> (String, &'static str) {
    let registry = engine.registry();
    match kind {
        RuleKind::Sanitization => match registry.resolve_sanitizer(rule.name(), rule.arguments()) {
            Ok(resolved) => (resolved.canonical_name.clone(), resolved.origin()),
            Err(_) => (rule.name().to_string(), "unknown"),
        },
        RuleKind::Validation => match registry.resolve_validator(rule.name(), rule.arguments()) {
            Some(resolved) => (resolved.canonical_name.clone(), resolved.origin()),
            None => (rule.name().to_string(), "unknown"),
        },
    }
}

/// Builds one row per configured rule, in field then execution order.
pub fn build_rule_table(engine: &ValidationEngine) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header_cell("Field"),
            header_cell("Label"),
            header_cell("Kind"),
            header_cell("Rule"),
            header_cell("Arguments"),
            header_cell("Message"),
            header_cell("Resolves To"),
        ]);

    for (field, set) in engine.fields() {
        let lists = [
            (RuleKind::Sanitization, set.sanitizations()),
            (RuleKind::Validation, set.validations()),
        ];
        for (kind, rules) in lists {
            for rule in rules {
                let (canonical, origin) = resolution(engine, kind, rule);
                let origin_cell = if origin == "unknown" {
                    Cell::new(origin).fg(Color::Red).add_attribute(Attribute::Bold)
                } else {
                    Cell::new(format!("{canonical} ({origin})"))
                };
                table.add_row(vec![
                    Cell::new(field),
                    Cell::new(set.label()),
                    Cell::new(kind),
                    Cell::new(rule.name()),
                    Cell::new(rule.arguments().join(", ")),
                    Cell::new(rule.error_message().unwrap_or("-")),
                    origin_cell,
                ]);
            }
        }
    }

    table
}
