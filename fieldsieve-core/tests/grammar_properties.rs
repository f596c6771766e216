//! Property-based tests for the rule grammar and sanitizer idempotence.

use fieldsieve_core::{parse_rules, sanitize_once, to_rule_string, RuleDescriptor, RuleKind};
use proptest::prelude::*;
use serde_json::{json, Map};

fn descriptor() -> impl Strategy<Value = RuleDescriptor> {
    (
        "[a-z][a-z0-9_]{0,10}",
        prop::collection::vec("[a-zA-Z0-9_./,:;|-]{1,8}", 0..4),
        prop::option::of(r#"[a-zA-Z0-9 .,;:|'"\\{}-]{1,20}"#),
    )
        .prop_map(|(name, arguments, message)| {
            let rule = RuleDescriptor::new(name, arguments);
            match message {
                Some(message) => rule.with_message(message),
                None => rule,
            }
        })
}

// ============================================================================
// ROUND TRIP: parse(serialize(rules)) == rules
// ============================================================================

proptest! {
    #[test]
    fn validation_rules_round_trip(rules in prop::collection::vec(descriptor(), 1..5)) {
        let text = to_rule_string(&rules);
        let parsed = parse_rules(&text, RuleKind::Validation).unwrap();
        prop_assert_eq!(parsed, rules);
    }

    #[test]
    fn sanitization_rules_round_trip_without_messages(rules in prop::collection::vec(descriptor(), 1..5)) {
        let text = to_rule_string(&rules);
        let parsed = parse_rules(&text, RuleKind::Sanitization).unwrap();
        prop_assert_eq!(parsed.len(), rules.len());
        for (parsed, original) in parsed.iter().zip(&rules) {
            prop_assert_eq!(parsed.name(), original.name());
            prop_assert_eq!(parsed.arguments(), original.arguments());
            prop_assert_eq!(parsed.error_message(), None);
        }
    }

    #[test]
    fn parser_never_panics(s in ".{0,40}") {
        let _ = parse_rules(&s, RuleKind::Validation);
    }
}

// ============================================================================
// IDEMPOTENCE: sanitize(sanitize(x)) == sanitize(x)
// ============================================================================

proptest! {
    #[test]
    fn normalizing_sanitizers_are_idempotent(
        s in ".{0,30}",
        rules in prop::sample::select(vec!["trim", "urlencode", "integer", "trim|urlencode"]),
    ) {
        let mut input = Map::new();
        input.insert("f".to_string(), json!(s));

        let once = sanitize_once(&input, [("f", rules)]).unwrap();
        let twice = sanitize_once(&once, [("f", rules)]).unwrap();
        prop_assert_eq!(once, twice);
    }
}
