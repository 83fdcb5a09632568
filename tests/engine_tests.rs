//! Engine integration tests
//!
//! Exercises the parse surface end to end: comment extraction, grammar
//! matching, classification, and the engine facade over a document provider.

use acp_engine::{
    classify, parse_annotations, AnnotationEngine, Category, DiagnosticKind, MemoryDocuments,
    Severity,
};

// =============================================================================
// Parse round trips
// =============================================================================

mod round_trips {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lock_frozen() {
        let outcome = parse_annotations("typescript", "// @acp:lock(\"frozen\")\n");
        assert_eq!(outcome.annotations.len(), 1);

        let ann = &outcome.annotations[0];
        assert_eq!(ann.namespace, "lock");
        assert_eq!(ann.value.as_deref(), Some("frozen"));
        assert_eq!(ann.category, Category::Constraint);
        assert!(ann.diagnostics.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_namespace_warns_and_defaults() {
        let outcome = parse_annotations("typescript", "// @acp:bogus(\"x\")\n");
        assert_eq!(outcome.annotations.len(), 1);

        let ann = &outcome.annotations[0];
        assert_eq!(ann.namespace, "bogus");
        assert_eq!(ann.category, Category::SymbolLevel);
        assert_eq!(ann.diagnostics.len(), 1);
        assert_eq!(ann.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_value_exactly_one_diagnostic() {
        let outcome = parse_annotations("typescript", "// @acp:fn\n");
        assert_eq!(outcome.annotations.len(), 1);

        let ann = &outcome.annotations[0];
        assert_eq!(ann.value, None);
        let missing: Vec<_> = ann
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MissingValue)
            .collect();
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn test_all_lock_levels_accepted() {
        for level in [
            "frozen",
            "restricted",
            "approval-required",
            "tests-required",
            "docs-required",
            "review-required",
            "normal",
            "experimental",
        ] {
            let text = format!("// @acp:lock(\"{}\")\n", level);
            let outcome = parse_annotations("typescript", &text);
            assert!(
                outcome.diagnostics.is_empty(),
                "level {} should be valid",
                level
            );
        }
    }

    #[test]
    fn test_invalid_lock_level_is_error() {
        let outcome = parse_annotations("typescript", "// @acp:lock(\"unbreakable\")\n");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::InvalidLockLevel);
        assert_eq!(outcome.diagnostics[0].severity, Severity::Error);
    }
}

// =============================================================================
// Testable properties: idempotence and range correctness
// =============================================================================

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
// @acp:module("Billing")
/**
 * @acp:fn("charge")
 * @acp:param({number} amount) - Amount in cents
 * @acp:lock("restricted") - Talk to payments first
 */
function charge(amount) {}

// @acp:todo - wire up retries | ticket:PAY-311
const RETRIES = 3; /* @acp:note("see $SYM_CHARGE.ref") */
"#;

    #[test]
    fn test_parse_is_idempotent() {
        let a = parse_annotations("javascript", SAMPLE);
        let b = parse_annotations("javascript", SAMPLE);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_every_range_reproduces_raw() {
        let outcome = parse_annotations("javascript", SAMPLE);
        assert!(outcome.annotations.len() >= 5);
        for ann in &outcome.annotations {
            assert_eq!(
                &SAMPLE[ann.range.start..ann.range.end],
                ann.raw,
                "range mismatch for @acp:{}",
                ann.namespace
            );
        }
    }

    #[test]
    fn test_category_totality() {
        for (namespace, expected) in [
            ("module", Category::FileLevel),
            ("owner", Category::FileLevel),
            ("fn", Category::SymbolLevel),
            ("returns", Category::SymbolLevel),
            ("lock", Category::Constraint),
            ("ai-avoid", Category::Constraint),
            ("fixme", Category::Inline),
            ("perf", Category::Inline),
        ] {
            assert_eq!(classify(namespace), Some(expected), "{}", namespace);
        }
        assert_eq!(classify("definitely-not-a-namespace"), None);
    }
}

// =============================================================================
// Engine facade over a document provider
// =============================================================================

mod facade {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> AnnotationEngine<MemoryDocuments> {
        let mut docs = MemoryDocuments::new();
        docs.insert(
            "src/auth.ts",
            "typescript",
            "// @acp:purpose(\"auth\")\n// @acp:lock(\"frozen\")\n",
        );
        docs.insert(
            "project.vars.json",
            "json",
            r#"{"variables": {
                "API_KEY": "secret123",
                "SYM_CHARGE": {"value": "src/billing.ts:charge", "description": "Charge entry point"}
            }}"#,
        );
        let mut engine = AnnotationEngine::new(docs);
        engine.refresh();
        engine
    }

    #[test]
    fn test_parse_document() {
        let engine = engine();
        let outcome = engine.parse_document("src/auth.ts").unwrap();
        assert_eq!(outcome.annotations.len(), 2);
        assert_eq!(outcome.annotations[0].namespace, "purpose");
        assert_eq!(outcome.annotations[1].namespace, "lock");
    }

    #[test]
    fn test_resolution_example() {
        let engine = engine();

        let plain = engine.resolve_variable("API_KEY", None).unwrap();
        assert_eq!(plain.rendered, "secret123");

        let reference = engine.resolve_variable("API_KEY", Some("ref")).unwrap();
        assert_ne!(reference.rendered, "secret123");
        assert!(reference.rendered.contains("API_KEY"));
    }

    #[test]
    fn test_is_variable_defined() {
        let engine = engine();
        assert!(engine.is_variable_defined("API_KEY"));
        assert!(engine.is_variable_defined("SYM_CHARGE"));
        assert!(engine.is_variable_defined("LINE"));
        assert!(!engine.is_variable_defined("UNSET"));
    }

    #[test]
    fn test_list_available_variables() {
        let engine = engine();
        let list = engine.list_available_variables();

        let api_key = list.iter().find(|v| v.name == "API_KEY").unwrap();
        assert_eq!(api_key.source, "project.vars.json");

        let builtin = list.iter().find(|v| v.name == "FILE").unwrap();
        assert_eq!(builtin.source, "builtin");
    }

    #[test]
    fn test_refresh_picks_up_changes() {
        let mut docs = MemoryDocuments::new();
        docs.insert("a.vars.json", "json", r#"{"variables": {"FIRST": "1"}}"#);
        let mut engine = AnnotationEngine::new(docs);
        engine.refresh();
        assert!(engine.is_variable_defined("FIRST"));
        assert!(!engine.is_variable_defined("SECOND"));
    }
}
